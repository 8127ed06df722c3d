//! Writes a synthetic MassHunter-style chromatogram export for trying out
//! `waterfaller`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

/// Generate a multi-sample MassHunter CSV export
#[derive(Parser)]
#[command(name = "generate_sample")]
struct Args {
    /// Output CSV path
    #[arg(value_name = "OUTPUT", default_value = "sample_export.csv")]
    output: PathBuf,

    /// Points per chromatogram
    #[arg(short, long, default_value = "1200")]
    points: usize,

    /// PRNG seed
    #[arg(short, long, default_value = "42")]
    seed: u64,
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

fn generate_trace(
    times: &[f64],
    peaks: &[(f64, f64, f64)],
    baseline: f64,
    noise_level: f64,
    rng: &mut Xoshiro256,
) -> Vec<f64> {
    times
        .iter()
        .map(|&t| {
            let signal: f64 = peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(t, mu, sigma, amp))
                .sum();
            (baseline + signal + rng.normal(0.0, noise_level)).max(0.0).round()
        })
        .collect()
}

/// xoshiro256** seeded through splitmix64, so runs are reproducible per seed.
struct Xoshiro256 {
    s: [u64; 4],
}

impl Xoshiro256 {
    fn seed_from(seed: u64) -> Self {
        let mut sm = seed;
        let mut next = || {
            sm = sm.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = sm;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^ (z >> 31)
        };
        Self {
            s: [next(), next(), next(), next()],
        }
    }

    fn next_u64(&mut self) -> u64 {
        let [s0, s1, s2, s3] = self.s;
        let out = s1.wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let s2 = s2 ^ s0;
        let s3 = s3 ^ s1;
        self.s = [s0 ^ s3, s1 ^ s2, s2 ^ (s1 << 17), s3.rotate_left(45)];
        out
    }

    /// Uniform in `[0, 1)`.
    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Box-Muller normal deviate.
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.uniform().max(f64::MIN_POSITIVE);
        let u2 = self.uniform();
        mean + std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = Xoshiro256::seed_from(args.seed);

    // One point every 0.5 s starting at the first scan.
    let times: Vec<f64> = (0..args.points)
        .map(|i| 0.0083 + i as f64 / 120.0)
        .collect();

    // (name, [(retention time, width, height)])
    let samples: [(&str, Vec<(f64, f64, f64)>); 4] = [
        ("blank", vec![(0.9, 0.05, 4.0e4)]),
        ("propargylglycine", vec![(0.9, 0.05, 4.0e4), (3.2, 0.08, 6.5e5)]),
        ("allylglycine", vec![(0.9, 0.05, 4.0e4), (4.1, 0.09, 8.0e5)]),
        (
            "phenylthreonine",
            vec![(0.9, 0.05, 4.0e4), (6.7, 0.07, 3.0e5), (7.4, 0.1, 1.2e5)],
        ),
    ];

    let file = std::fs::File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);

    // The first sample's name line doubles as the file header; every later
    // one is a boundary marker. The layout is the same either way.
    for (name, peaks) in &samples {
        writer.write_record([format!("+ESI TIC Scan Frag=125.0V {name}.d")])?;
        writer.write_record(["#Point", "X(Minutes)", "Y(Counts)"])?;

        let intensity = generate_trace(&times, peaks, 1.5e4, 2.0e3, &mut rng);
        for (point, (t, y)) in times.iter().zip(&intensity).enumerate() {
            writer.write_record([point.to_string(), format!("{t:.4}"), y.to_string()])?;
        }
    }
    writer.flush()?;

    println!(
        "Wrote {} chromatograms ({} points each) to {}",
        samples.len(),
        times.len(),
        args.output.display()
    );
    Ok(())
}
