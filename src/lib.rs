mod error;
mod normalize;
mod station;
mod transport;
mod types;

pub use error::BuoyantError;

pub use normalize::error::NormalizeError;
pub use normalize::group::{GroupDecoder, GroupRow};
pub use normalize::record::{parse_tabular, RawRecord};
pub use normalize::resolver::PropertyResolver;
pub use normalize::timestamp::{iso_format, parse_iso, parse_zoned, Timestamp};
pub use normalize::tree::{Coercion, DecodeTables, TreeDecoder, TreeObservation};
pub use normalize::unit::extract_unit;

pub use station::buoy::{Buoy, Property};

pub use transport::client::{FeedSource, NdbcClient};
pub use transport::error::TransportError;
pub use transport::sos::SosRequest;

pub use types::catalog::PropertyCatalog;
pub use types::observation::Observation;
pub use types::property_value::PropertyValue;
pub use types::station::{Coordinates, StationIdentity};
