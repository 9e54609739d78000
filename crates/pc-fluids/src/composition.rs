//! Working-fluid composition (pure fluid or mixture).

use crate::error::{FluidError, FluidResult};
use crate::species::Species;
use pc_core::numeric::{Tolerances, nearly_equal};

/// Fluid charge defined by normalized mole fractions.
///
/// Species whose normalized fraction is negligible are dropped, so a mixture
/// specified as `Propane * nButane` with fractions `[1.0, 0.0]` collapses to
/// pure propane.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    items: Vec<(Species, f64)>,
}

impl Composition {
    /// Create a pure-species composition.
    pub fn pure(species: Species) -> Self {
        Self {
            items: vec![(species, 1.0)],
        }
    }

    /// Create a composition from mole fractions.
    ///
    /// Validates that all fractions are finite, non-negative, and have a positive sum,
    /// then normalizes to sum=1.
    pub fn new_mole_fractions(fractions: Vec<(Species, f64)>) -> FluidResult<Self> {
        if fractions.is_empty() {
            return Err(FluidError::InvalidArg {
                what: "empty composition",
            });
        }

        let mut sum = 0.0;
        for (_, frac) in &fractions {
            if !frac.is_finite() {
                return Err(FluidError::NonPhysical {
                    what: "non-finite mole fraction",
                });
            }
            if *frac < 0.0 {
                return Err(FluidError::NonPhysical {
                    what: "negative mole fraction",
                });
            }
            sum += frac;
        }

        if sum <= 0.0 || !sum.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "mole fractions sum to zero or non-finite",
            });
        }

        let normalized: Vec<(Species, f64)> = fractions
            .into_iter()
            .map(|(s, f)| (s, f / sum))
            .filter(|(_, f)| *f > 1e-15)
            .collect();

        if normalized.is_empty() {
            return Err(FluidError::NonPhysical {
                what: "all mole fractions negligible",
            });
        }

        Ok(Self { items: normalized })
    }

    /// Build a composition from a `"A * B * C"` fluid string and matching fractions.
    pub fn from_fluid_string(fluids: &str, fractions: &[f64]) -> FluidResult<Self> {
        let species = fluids
            .split('*')
            .map(|name| {
                name.parse::<Species>().map_err(|_| FluidError::InvalidArg {
                    what: "unknown species in fluid string",
                })
            })
            .collect::<FluidResult<Vec<_>>>()?;

        if species.len() != fractions.len() {
            return Err(FluidError::InvalidArg {
                what: "fluid string and fraction count differ",
            });
        }

        Self::new_mole_fractions(species.into_iter().zip(fractions.iter().copied()).collect())
    }

    /// Get mole fraction of a species (0.0 if not present).
    pub fn mole_fraction(&self, species: Species) -> f64 {
        self.items
            .iter()
            .find(|(s, _)| *s == species)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    /// Returns `Some(species)` if exactly one species has fraction ≈1.0.
    pub fn is_pure(&self) -> Option<Species> {
        if self.items.len() == 1 {
            let (species, frac) = self.items[0];
            let tol = Tolerances {
                abs: 1e-10,
                rel: 1e-10,
            };
            if nearly_equal(frac, 1.0, tol) {
                return Some(species);
            }
        }
        None
    }

    /// Iterate over all species with non-zero mole fractions.
    pub fn iter(&self) -> impl Iterator<Item = (Species, f64)> + '_ {
        self.items.iter().copied()
    }

    /// Mixture molar mass [kg/mol], M_mix = Σ x_i·M_i.
    pub fn molar_mass(&self) -> f64 {
        self.items
            .iter()
            .map(|(species, mole_frac)| species.molar_mass() * mole_frac)
            .sum::<f64>()
            * 1e-3
    }
}

impl std::fmt::Display for Composition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .items
            .iter()
            .map(|(s, x)| format!("{}[{:.4}]", s.key(), x))
            .collect();
        write!(f, "{}", parts.join(" * "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_composition() {
        let comp = Composition::pure(Species::Propane);
        assert_eq!(comp.is_pure(), Some(Species::Propane));
        assert_eq!(comp.mole_fraction(Species::Propane), 1.0);
        assert_eq!(comp.mole_fraction(Species::NButane), 0.0);
    }

    #[test]
    fn fluid_string_with_zero_fraction_is_pure() {
        let comp = Composition::from_fluid_string("Propane * Butane", &[1.0, 0.0]).unwrap();
        assert_eq!(comp.is_pure(), Some(Species::Propane));
    }

    #[test]
    fn fluid_string_length_mismatch() {
        let result = Composition::from_fluid_string("Propane * Butane", &[1.0]);
        assert!(matches!(result, Err(FluidError::InvalidArg { .. })));
        assert!(Composition::from_fluid_string("Propane * Unobtainium", &[0.5, 0.5]).is_err());
    }

    #[test]
    fn mixture_normalization_non_unit_sum() {
        let comp =
            Composition::new_mole_fractions(vec![(Species::Propane, 2.0), (Species::NButane, 8.0)])
                .unwrap();

        let tol = Tolerances {
            abs: 1e-10,
            rel: 1e-10,
        };
        assert_eq!(comp.is_pure(), None);
        assert!(nearly_equal(comp.mole_fraction(Species::Propane), 0.2, tol));
        assert!(nearly_equal(comp.mole_fraction(Species::NButane), 0.8, tol));
    }

    #[test]
    fn mixture_molar_mass_is_mole_weighted() {
        let comp =
            Composition::new_mole_fractions(vec![(Species::Propane, 0.5), (Species::NButane, 0.5)])
                .unwrap();
        let expected = 0.5 * (44.097 + 58.124) * 1e-3;
        assert!((comp.molar_mass() - expected).abs() < 1e-12);
    }

    #[test]
    fn invalid_fractions() {
        assert!(Composition::new_mole_fractions(vec![]).is_err());
        assert!(
            Composition::new_mole_fractions(vec![(Species::N2, -0.5), (Species::CO2, 1.5)])
                .is_err()
        );
        assert!(
            Composition::new_mole_fractions(vec![(Species::N2, 0.0), (Species::CO2, 0.0)]).is_err()
        );
        assert!(Composition::new_mole_fractions(vec![(Species::N2, f64::NAN)]).is_err());
    }

    #[test]
    fn display_lists_species() {
        let comp = Composition::pure(Species::R134a);
        assert_eq!(comp.to_string(), "R134a[1.0000]");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalized_sum_is_one(fracs in prop::collection::vec(0.0_f64..1.0_f64, 1..5)) {
            let species = [Species::Propane, Species::NButane, Species::Isobutane, Species::CO2, Species::N2];
            let composition_input: Vec<(Species, f64)> = fracs
                .iter()
                .enumerate()
                .map(|(i, &f)| (species[i % species.len()], f))
                .collect();

            if let Ok(comp) = Composition::new_mole_fractions(composition_input) {
                let sum: f64 = comp.iter().map(|(_, f)| f).sum();
                let tol = Tolerances { abs: 1e-9, rel: 1e-9 };
                prop_assert!(nearly_equal(sum, 1.0, tol));
            }
        }
    }
}
