use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

const ROWS: usize = 600;
const ATTACK_RATE: f64 = 0.3;
const PROTOCOLS: [&str; 3] = ["tcp", "udp", "icmp"];

/// Box-Muller transform for normal distribution
fn gauss(rng: &mut SmallRng, mean: f64, std_dev: f64) -> f64 {
    let u1 = rng.random::<f64>().max(1e-15);
    let u2 = rng.random::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

struct Flow {
    duration: f64,
    bytes: i64,
    packets: i64,
    errors: i64,
    protocol: &'static str,
    attack: bool,
}

fn generate_flow(rng: &mut SmallRng) -> Flow {
    let attack = rng.random_bool(ATTACK_RATE);
    let (duration, packets, errors) = if attack {
        (
            gauss(rng, 0.5, 0.3),
            gauss(rng, 300.0, 80.0),
            gauss(rng, 6.0, 2.0),
        )
    } else {
        (
            gauss(rng, 2.0, 1.0),
            gauss(rng, 40.0, 15.0),
            gauss(rng, 0.5, 0.7),
        )
    };
    let packets = packets.round().max(1.0) as i64;
    let bytes = (packets as f64 * gauss(rng, 600.0, 100.0).max(40.0)).round() as i64;
    Flow {
        duration: (duration.max(0.01) * 1000.0).round() / 1000.0,
        bytes,
        packets,
        errors: errors.round().max(0.0) as i64,
        protocol: PROTOCOLS[rng.random_range(0..PROTOCOLS.len())],
        attack,
    }
}

fn write_csv(path: &str, flows: &[Flow], with_label: bool) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    let mut header = vec!["duration", "bytes", "packets", "errors", "protocol"];
    if with_label {
        header.push("label");
    }
    writer.write_record(&header)?;
    for f in flows {
        let mut record = vec![
            f.duration.to_string(),
            f.bytes.to_string(),
            f.packets.to_string(),
            f.errors.to_string(),
            f.protocol.to_string(),
        ];
        if with_label {
            record.push(u8::from(f.attack).to_string());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(42);

    let labeled: Vec<Flow> = (0..ROWS).map(|_| generate_flow(&mut rng)).collect();
    let unlabeled: Vec<Flow> = (0..ROWS).map(|_| generate_flow(&mut rng)).collect();
    let attacks = labeled.iter().filter(|f| f.attack).count();

    write_csv("sample_traffic.csv", &labeled, true)?;
    write_csv("sample_monitor.csv", &unlabeled, false)?;

    let model = json!({
        "kind": "logistic",
        "feature_names": ["duration", "packets", "errors"],
        "weights": [-0.8, 0.02, 0.6],
        "bias": -4.0,
        "threshold": 0.5,
    });
    std::fs::write("sample_model.json", serde_json::to_string_pretty(&model)?)
        .context("writing sample_model.json")?;

    println!(
        "Wrote {ROWS} labeled flows ({attacks} attacks) to sample_traffic.csv, \
         {ROWS} unlabeled flows to sample_monitor.csv and a logistic model to sample_model.json"
    );
    Ok(())
}
