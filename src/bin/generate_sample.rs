//! Writes a synthetic set of the four source tables, with the zip-code
//! defects seen in real exports, into a directory (default `sample_data`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// Render a canonical zip the way one of the messy sources might.
fn messy_zip(zip: &str, rng: &mut SimpleRng) -> String {
    match rng.below(8) {
        // Leading zero lost by a numeric column.
        0 => zip.trim_start_matches('0').to_string(),
        // Numeric column with a spurious decimal.
        1 => format!("{}.0", zip.trim_start_matches('0')),
        // ZIP+4.
        2 => format!("{zip}-{:04}", rng.below(10_000)),
        // Stray prefix.
        3 => format!("MA {zip}"),
        // Missing.
        4 if rng.chance(0.3) => String::new(),
        _ => zip.to_string(),
    }
}

fn write_rows(path: &Path, header: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);

    // New England style codes so the leading-zero repair matters.
    let zips: Vec<String> = (0..40)
        .map(|i| format!("0{:04}", 1001 + i * 37 + rng.below(30) as usize))
        .collect();

    // Facilities
    let mut facilities = Vec::new();
    for id in 0..120 {
        let zip = &zips[rng.below(zips.len() as u64) as usize];
        let caps: Vec<u64> = (0..4).map(|_| rng.below(25)).collect();
        let children: u64 = caps.iter().sum();
        let coord = |rng: &mut SimpleRng, lo: f64, hi: f64| {
            if rng.chance(0.05) {
                String::new()
            } else {
                format!("{:.6}", rng.range(lo, hi))
            }
        };
        let mut row = vec![
            format!("F{id:05}"),
            format!("Facility {id}"),
            messy_zip(zip, &mut rng),
        ];
        row.extend(caps.iter().map(u64::to_string));
        row.push(children.to_string());
        row.push((children + rng.below(10)).to_string());
        row.push(coord(&mut rng, 41.2, 42.9));
        row.push(coord(&mut rng, -73.4, -69.9));
        row.push(if rng.chance(0.5) { "center".into() } else { "family".into() });
        facilities.push(row);
    }
    write_rows(
        &out_dir.join("child_care_regulated.csv"),
        &[
            "facility_id",
            "program_name",
            "zip_code",
            "infant_capacity",
            "toddler_capacity",
            "preschool_capacity",
            "school_age_capacity",
            "children_capacity",
            "total_capacity",
            "latitude",
            "longitude",
            "program_type",
        ],
        &facilities,
    )?;

    // Population by age band
    let population: Vec<Vec<String>> = zips
        .iter()
        .map(|zip| {
            let mut row = vec![messy_zip(zip, &mut rng)];
            for _ in 0..4 {
                row.push(if rng.chance(0.05) {
                    String::new()
                } else {
                    (200 + rng.below(2000)).to_string()
                });
            }
            row
        })
        .collect();
    write_rows(
        &out_dir.join("population.csv"),
        &["zipcode", "-5", "5-9", "10-14", "15-19"],
        &population,
    )?;

    // Income and employment cover overlapping but different zip sets.
    let income: Vec<Vec<String>> = zips[..32]
        .iter()
        .map(|zip| {
            vec![
                messy_zip(zip, &mut rng),
                format!("{}", 35_000 + rng.below(90_000)),
            ]
        })
        .collect();
    write_rows(
        &out_dir.join("avg_individual_income.csv"),
        &["ZIP code", "Average individual income (USD)"],
        &income,
    )?;

    let employment: Vec<Vec<String>> = zips[8..]
        .iter()
        .map(|zip| vec![messy_zip(zip, &mut rng), format!("{:.3}", rng.range(0.35, 0.80))])
        .collect();
    write_rows(
        &out_dir.join("employment_rate.csv"),
        &["zipcode", "Employment rate (16+)"],
        &employment,
    )?;

    println!(
        "Wrote {} facilities, {} population rows, {} income rows, {} employment rows to {}",
        facilities.len(),
        population.len(),
        income.len(),
        employment.len(),
        out_dir.display()
    );
    Ok(())
}
