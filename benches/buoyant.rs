use buoyant::{parse_tabular, GroupDecoder, PropertyCatalog, PropertyResolver};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const WAVES_CSV: &str = "station_id,sensor_id,\"latitude (degree)\",\"longitude (degree)\",date_time,\"sea_surface_wave_significant_height (m)\",\"sea_surface_wave_peak_period (s)\",\"sea_surface_wave_mean_period (s)\",\"number_of_frequencies (count)\",\"center_frequencies (Hz)\",\"bandwidths (Hz)\",\"spectral_energy (m**2/Hz)\",\"mean_wave_direction (degree)\",calculation_method,\"sampling_rate (Hz)\"\n\
urn:ioos:station:wmo:41012,urn:ioos:sensor:wmo:41012::wpm1,30.04,-80.53,2017-03-01T12:40:00Z,1.5,8.33,5.8,5,0.0325;0.0375;0.0425;0.0475;0.0525,0.005;0.005;0.005;0.005;0.005,0;0;0;0;0.117495,210;212;215;220;230,Longuet-Higgins (1964),1.28\n\
urn:ioos:station:wmo:41012,urn:ioos:sensor:wmo:41012::wpm1,30.04,-80.53,2017-03-01T13:40:00Z,1.4,7.69,5.6,5,0.0325;0.0375;0.0425;0.0475;0.0525,0.005;0.005;0.005;0.005;0.005,0;0;0.01;0.2;0.1,211;214;216;221;229,Longuet-Higgins (1964),1.28\n";

fn bench_normalize(c: &mut Criterion) {
    let catalog = PropertyCatalog::ndbc();
    let records = parse_tabular(WAVES_CSV).expect("benchmark payload parses");

    c.bench_function("parse_tabular", |b| b.iter(|| parse_tabular(black_box(WAVES_CSV))));
    c.bench_function("resolve_spectral_energy", |b| {
        b.iter(|| PropertyResolver::new(&catalog, &records[0]).resolve(black_box("spectral_energy")))
    });
    c.bench_function("decode_waves", |b| {
        b.iter(|| {
            GroupDecoder::for_group(&catalog, "waves").and_then(|decoder| decoder.decode(black_box(&records)))
        })
    });
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
