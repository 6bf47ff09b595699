use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ecoponto_core::model::{GeoPosition, Region};

#[derive(Debug, Parser)]
#[command(author, version, about = "Find waste collection points near you")]
pub(crate) struct Config {
    /// Base URL of the collection point backend
    #[arg(long, env = "ECOPONTO_API_URL", default_value = ecoponto_provider_api::DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Base URL of the IBGE localities API (or a mirror)
    #[arg(long, env = "ECOPONTO_REGIONS_URL", default_value = ecoponto_provider_ibge::DEFAULT_BASE_URL)]
    pub regions_url: String,

    /// IP geolocation endpoint used when no position is given
    #[arg(long, env = "ECOPONTO_GEOIP_URL", default_value = ecoponto_provider_geo::DEFAULT_GEOIP_URL)]
    pub geoip_url: String,

    /// Use this position instead of looking it up, as `LAT,LON`
    #[arg(long, env = "ECOPONTO_POSITION", value_parser = parse_position, allow_hyphen_values = true)]
    pub position: Option<GeoPosition>,

    /// Refuse location access; the map stays hidden
    #[arg(long)]
    pub no_location: bool,

    /// Timeout for every network request, in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Log file (the terminal is taken by the UI)
    #[arg(long, env = "ECOPONTO_LOG", default_value = "ecoponto.log")]
    pub log_file: PathBuf,

    /// State code to open directly, together with --city
    #[arg(long, requires = "city")]
    pub uf: Option<String>,

    /// City to open directly, together with --uf
    #[arg(long, requires = "uf")]
    pub city: Option<String>,
}

impl Config {
    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Region given on the command line, if any.
    pub(crate) fn region(&self) -> Option<Region> {
        match (&self.uf, &self.city) {
            (Some(uf), Some(city)) => Some(Region::new(uf.to_uppercase(), city.as_str())),
            _ => None,
        }
    }
}

fn parse_position(raw: &str) -> Result<GeoPosition, String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON but got {raw:?}"))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|err| format!("invalid latitude {lat:?}: {err}"))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|err| format!("invalid longitude {lon:?}: {err}"))?;

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(format!("latitude {latitude} out of range"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(format!("longitude {longitude} out of range"));
    }
    Ok(GeoPosition::new(latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_position() {
        let position = parse_position("-23.55, -46.63").unwrap();
        assert_eq!(position, GeoPosition::new(-23.55, -46.63));
        assert_eq!(parse_position("0,0").unwrap(), GeoPosition::new(0.0, 0.0));
    }

    #[test]
    fn rejects_bad_positions() {
        assert!(parse_position("-23.55").is_err());
        assert!(parse_position("north,-46.63").is_err());
        assert!(parse_position("91,0").is_err());
        assert!(parse_position("0,181").is_err());
    }

    #[test]
    fn region_needs_both_parts() {
        let config = Config::parse_from(["ecoponto", "--uf", "sp", "--city", "Sao Paulo"]);
        assert_eq!(config.region(), Some(Region::new("SP", "Sao Paulo")));

        let config = Config::parse_from(["ecoponto", "--position", "-23.5,-46.6"]);
        assert_eq!(config.region(), None);
        assert_eq!(config.position, Some(GeoPosition::new(-23.5, -46.6)));
    }
}
