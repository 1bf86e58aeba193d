pub mod buoy;
