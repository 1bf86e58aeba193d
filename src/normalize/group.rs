//! Decodes grouped properties (currents, waves, winds): every record of the
//! response is resolved against the group's full list of sub-properties.

use crate::normalize::error::NormalizeError;
use crate::normalize::record::RawRecord;
use crate::normalize::resolver::PropertyResolver;
use crate::types::catalog::PropertyCatalog;
use crate::types::property_value::PropertyValue;
use indexmap::IndexMap;
use log::debug;

/// One decoded record of a grouped property: sub-property stub to value, in
/// the order the group lists its sub-properties.
pub type GroupRow = IndexMap<String, PropertyValue>;

pub struct GroupDecoder<'a> {
    catalog: &'a PropertyCatalog,
    subproperties: &'a [String],
}

impl<'a> GroupDecoder<'a> {
    pub fn new(catalog: &'a PropertyCatalog, subproperties: &'a [String]) -> Self {
        Self {
            catalog,
            subproperties,
        }
    }

    /// Builds a decoder for one of the catalog's named groups.
    pub fn for_group(catalog: &'a PropertyCatalog, group: &str) -> Result<Self, NormalizeError> {
        catalog
            .group(group)
            .map(|subproperties| Self::new(catalog, subproperties))
            .ok_or_else(|| NormalizeError::UnknownProperty(group.to_string()))
    }

    /// Produces one row per input record, each holding every sub-property.
    ///
    /// Records are never dropped; a sub-property absent from a record maps to
    /// [`PropertyValue::Missing`] in that row.
    pub fn decode(&self, records: &[RawRecord]) -> Result<Vec<GroupRow>, NormalizeError> {
        let rows = records
            .iter()
            .map(|record| self.decode_record(record))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Decoded {} group rows over {} sub-properties",
            rows.len(),
            self.subproperties.len()
        );
        Ok(rows)
    }

    fn decode_record(&self, record: &RawRecord) -> Result<GroupRow, NormalizeError> {
        let resolver = PropertyResolver::new(self.catalog, record);
        self.subproperties
            .iter()
            .map(|stub| -> Result<(String, PropertyValue), NormalizeError> {
                Ok((stub.clone(), resolver.resolve(stub)?))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::record::parse_tabular;
    use crate::types::catalog::WINDS;

    const WAVES_CSV: &str = "station_id,sensor_id,\"latitude (degree)\",\"longitude (degree)\",date_time,\"sea_surface_wave_significant_height (m)\",\"sea_surface_wave_peak_period (s)\",\"number_of_frequencies (count)\",\"spectral_energy (m**2/Hz)\",calculation_method\n\
urn:ioos:station:wmo:41012,urn:ioos:sensor:wmo:41012::wpm1,30.04,-80.53,2017-03-01T12:40:00Z,1.5,8.33,5,0;0;0;0;0.117495,Longuet-Higgins (1964)\n\
urn:ioos:station:wmo:41012,urn:ioos:sensor:wmo:41012::wpm1,30.04,-80.53,2017-03-01T13:40:00Z,1.4,,5,0;0;0.01;0.2;0.1,\n";

    #[test]
    fn test_rows_hold_exactly_the_requested_keys() -> Result<(), NormalizeError> {
        let catalog = PropertyCatalog::ndbc();
        let records = parse_tabular(WAVES_CSV)?;
        let decoder = GroupDecoder::for_group(&catalog, "waves")?;

        let rows = decoder.decode(&records)?;
        let expected = catalog.group("waves").unwrap();

        assert_eq!(rows.len(), records.len());
        for row in &rows {
            assert_eq!(row.len(), expected.len());
            assert!(row.keys().eq(expected.iter()));
        }
        Ok(())
    }

    #[test]
    fn test_values_decode_per_row() -> Result<(), NormalizeError> {
        let catalog = PropertyCatalog::ndbc();
        let rows = GroupDecoder::for_group(&catalog, "waves")?.decode(&parse_tabular(WAVES_CSV)?)?;

        assert_eq!(rows[0]["sea_surface_wave_significant_height"].as_f64(), Some(1.5));
        assert_eq!(rows[1]["sea_surface_wave_significant_height"].as_f64(), Some(1.4));
        assert_eq!(
            rows[0]["spectral_energy"].as_observations().map(|bins| bins.len()),
            Some(5)
        );
        assert_eq!(
            rows[0]["calculation_method"],
            PropertyValue::Text("Longuet-Higgins (1964)".into())
        );
        // Empty cells and columns the feed omitted both come back missing.
        assert!(rows[1]["sea_surface_wave_peak_period"].is_missing());
        assert!(rows[1]["calculation_method"].is_missing());
        assert!(rows[0]["polar_coordinate_r2"].is_missing());
        Ok(())
    }

    #[test]
    fn test_no_records_no_rows() -> Result<(), NormalizeError> {
        let catalog = PropertyCatalog::ndbc();
        let rows = GroupDecoder::for_group(&catalog, "winds")?.decode(&[])?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[test]
    fn test_custom_subproperty_list() -> Result<(), NormalizeError> {
        let catalog = PropertyCatalog::ndbc();
        let subs: Vec<String> = WINDS[..2].iter().map(|s| s.to_string()).collect();
        let record: RawRecord = [("wind_from_direction (degree)", "250"), ("wind_speed (m/s)", "7.2")]
            .into_iter()
            .collect();

        let rows = GroupDecoder::new(&catalog, &subs).decode(&[record])?;
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0]["wind_speed"].unit(), Some("m/s"));
        Ok(())
    }

    #[test]
    fn test_unknown_group() {
        let catalog = PropertyCatalog::ndbc();
        assert!(matches!(
            GroupDecoder::for_group(&catalog, "air_temperature"),
            Err(NormalizeError::UnknownProperty(_))
        ));
    }
}
