//! Working-fluid species for gas and refrigerant compressors.

/// Pure substances a compressor cylinder can be charged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    /// Nitrogen (N₂)
    N2,
    /// Air (pseudo-pure backend fluid)
    Air,
    /// Carbon dioxide (CO₂, R744)
    CO2,
    /// Ammonia (NH₃, R717)
    Ammonia,
    /// Helium
    He,
    /// Methane
    CH4,
    /// Ethane
    Ethane,
    /// Propane (R290)
    Propane,
    /// Propylene (R1270)
    Propylene,
    /// n-Butane (R600)
    NButane,
    /// Isobutane (R600a)
    Isobutane,
    /// n-Pentane
    NPentane,
    /// Refrigerant R32
    R32,
    /// Refrigerant R125
    R125,
    /// Refrigerant R134a
    R134a,
    /// Refrigerant R152a
    R152a,
    /// Refrigerant R245fa
    R245fa,
    /// Refrigerant R1234yf
    R1234yf,
}

impl Species {
    pub const ALL: [Species; 18] = [
        Species::N2,
        Species::Air,
        Species::CO2,
        Species::Ammonia,
        Species::He,
        Species::CH4,
        Species::Ethane,
        Species::Propane,
        Species::Propylene,
        Species::NButane,
        Species::Isobutane,
        Species::NPentane,
        Species::R32,
        Species::R125,
        Species::R134a,
        Species::R152a,
        Species::R245fa,
        Species::R1234yf,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Species::N2 => "N2",
            Species::Air => "Air",
            Species::CO2 => "CO2",
            Species::Ammonia => "NH3",
            Species::He => "He",
            Species::CH4 => "CH4",
            Species::Ethane => "Ethane",
            Species::Propane => "Propane",
            Species::Propylene => "Propylene",
            Species::NButane => "nButane",
            Species::Isobutane => "Isobutane",
            Species::NPentane => "nPentane",
            Species::R32 => "R32",
            Species::R125 => "R125",
            Species::R134a => "R134a",
            Species::R152a => "R152a",
            Species::R245fa => "R245fa",
            Species::R1234yf => "R1234yf",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Species::N2 => "Nitrogen",
            Species::Air => "Air",
            Species::CO2 => "Carbon Dioxide",
            Species::Ammonia => "Ammonia",
            Species::He => "Helium",
            Species::CH4 => "Methane",
            Species::Ethane => "Ethane",
            Species::Propane => "Propane",
            Species::Propylene => "Propylene",
            Species::NButane => "n-Butane",
            Species::Isobutane => "Isobutane",
            Species::NPentane => "n-Pentane",
            Species::R32 => "R32",
            Species::R125 => "R125",
            Species::R134a => "R134a",
            Species::R152a => "R152a",
            Species::R245fa => "R245fa",
            Species::R1234yf => "R1234yf",
        }
    }

    /// Map to rfluids Pure enum (internal use for CoolProp backend).
    pub(crate) fn rfluids_pure(&self) -> rfluids::substance::Pure {
        use rfluids::substance::Pure;
        match self {
            Species::N2 => Pure::Nitrogen,
            Species::Air => Pure::Air,
            Species::CO2 => Pure::CarbonDioxide,
            Species::Ammonia => Pure::Ammonia,
            Species::He => Pure::Helium,
            Species::CH4 => Pure::Methane,
            Species::Ethane => Pure::Ethane,
            Species::Propane => Pure::nPropane,
            Species::Propylene => Pure::Propylene,
            Species::NButane => Pure::nButane,
            Species::Isobutane => Pure::Isobutane,
            Species::NPentane => Pure::nPentane,
            Species::R32 => Pure::R32,
            Species::R125 => Pure::R125,
            Species::R134a => Pure::R134a,
            Species::R152a => Pure::R152a,
            Species::R245fa => Pure::R245fa,
            Species::R1234yf => Pure::R1234yf,
        }
    }

    /// Get molar mass [kg/kmol] for this species.
    ///
    /// Values sourced from standard reference data (e.g., NIST).
    pub fn molar_mass(&self) -> f64 {
        match self {
            Species::N2 => 28.014,
            Species::Air => 28.965,
            Species::CO2 => 44.010,
            Species::Ammonia => 17.031,
            Species::He => 4.003,
            Species::CH4 => 16.043,
            Species::Ethane => 30.070,
            Species::Propane => 44.097,
            Species::Propylene => 42.081,
            Species::NButane => 58.124,
            Species::Isobutane => 58.124,
            Species::NPentane => 72.151,
            Species::R32 => 52.024,
            Species::R125 => 120.022,
            Species::R134a => 102.031,
            Species::R152a => 66.051,
            Species::R245fa => 134.048,
            Species::R1234yf => 114.042,
        }
    }
}

impl std::str::FromStr for Species {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "N2" | "NITROGEN" => Ok(Species::N2),
            "AIR" => Ok(Species::Air),
            "CO2" | "R744" | "CARBONDIOXIDE" | "CARBON DIOXIDE" => Ok(Species::CO2),
            "NH3" | "R717" | "AMMONIA" => Ok(Species::Ammonia),
            "HE" | "HELIUM" => Ok(Species::He),
            "CH4" | "METHANE" => Ok(Species::CH4),
            "ETHANE" | "R170" => Ok(Species::Ethane),
            "PROPANE" | "C3H8" | "R290" => Ok(Species::Propane),
            "PROPYLENE" | "C3H6" | "R1270" => Ok(Species::Propylene),
            "NBUTANE" | "N-BUTANE" | "BUTANE" | "R600" => Ok(Species::NButane),
            "ISOBUTANE" | "I-BUTANE" | "R600A" => Ok(Species::Isobutane),
            "NPENTANE" | "N-PENTANE" | "PENTANE" => Ok(Species::NPentane),
            "R32" => Ok(Species::R32),
            "R125" => Ok(Species::R125),
            "R134A" => Ok(Species::R134a),
            "R152A" => Ok(Species::R152a),
            "R245FA" => Ok(Species::R245fa),
            "R1234YF" => Ok(Species::R1234yf),
            _ => Err("unknown species"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refrigerant_aliases_parse() {
        assert_eq!("R290".parse::<Species>().unwrap(), Species::Propane);
        assert_eq!("butane".parse::<Species>().unwrap(), Species::NButane);
        assert_eq!("R600a".parse::<Species>().unwrap(), Species::Isobutane);
        assert!("RP-1".parse::<Species>().is_err());
    }

    #[test]
    fn canonical_keys_roundtrip() {
        for species in Species::ALL {
            let parsed = species
                .key()
                .parse::<Species>()
                .expect("canonical key should parse");
            assert_eq!(parsed, species);
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(Species::NButane.display_name(), "n-Butane");
        assert_eq!(Species::CO2.display_name(), "Carbon Dioxide");
    }

    #[test]
    fn molar_masses_are_positive() {
        assert!(Species::ALL.iter().all(|s| s.molar_mass() > 0.0));
        assert!((Species::Propane.molar_mass() - 44.097).abs() < 1e-9);
    }
}
