//! Writes a synthetic `Electric_Vehicle_Population_Data.csv` so the
//! dashboard can be tried without the real registry export.

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    /// Pick an entry with probability proportional to its weight.
    fn weighted<'a, T>(&mut self, items: &'a [(T, u32)]) -> &'a T {
        let total: u32 = items.iter().map(|(_, w)| w).sum();
        let mut roll = (self.next_f64() * total as f64) as u32;
        for (item, w) in items {
            if roll < *w {
                return item;
            }
            roll -= w;
        }
        &items[items.len() - 1].0
    }
}

struct Model {
    make: &'static str,
    model: &'static str,
    phev: bool,
    range: u32,
    msrp: u32,
    first_year: i64,
}

const MODELS: &[(Model, u32)] = &[
    (Model { make: "TESLA", model: "MODEL Y", phev: false, range: 291, msrp: 0, first_year: 2020 }, 30),
    (Model { make: "TESLA", model: "MODEL 3", phev: false, range: 266, msrp: 0, first_year: 2017 }, 25),
    (Model { make: "TESLA", model: "MODEL S", phev: false, range: 337, msrp: 69_900, first_year: 2012 }, 6),
    (Model { make: "TESLA", model: "MODEL X", phev: false, range: 293, msrp: 79_500, first_year: 2016 }, 4),
    (Model { make: "NISSAN", model: "LEAF", phev: false, range: 150, msrp: 31_950, first_year: 2011 }, 12),
    (Model { make: "CHEVROLET", model: "BOLT EV", phev: false, range: 259, msrp: 36_620, first_year: 2017 }, 8),
    (Model { make: "CHEVROLET", model: "VOLT", phev: true, range: 53, msrp: 34_995, first_year: 2011 }, 5),
    (Model { make: "FORD", model: "MUSTANG MACH-E", phev: false, range: 230, msrp: 45_000, first_year: 2021 }, 5),
    (Model { make: "BMW", model: "X5", phev: true, range: 30, msrp: 59_900, first_year: 2016 }, 3),
    (Model { make: "BMW", model: "I3", phev: false, range: 153, msrp: 44_450, first_year: 2014 }, 2),
    (Model { make: "KIA", model: "NIRO", phev: true, range: 26, msrp: 27_990, first_year: 2018 }, 4),
    (Model { make: "TOYOTA", model: "PRIUS PRIME", phev: true, range: 25, msrp: 28_220, first_year: 2017 }, 4),
    (Model { make: "VOLVO", model: "XC90", phev: true, range: 18, msrp: 52_900, first_year: 2016 }, 2),
    (Model { make: "PORSCHE", model: "TAYCAN", phev: false, range: 203, msrp: 184_400, first_year: 2020 }, 1),
    (Model { make: "AUDI", model: "E-TRON", phev: false, range: 222, msrp: 65_900, first_year: 2019 }, 2),
    (Model { make: "RIVIAN", model: "R1T", phev: false, range: 314, msrp: 0, first_year: 2022 }, 2),
];

const COUNTIES: &[((&str, &str), u32)] = &[
    (("King", "Seattle"), 50),
    (("Snohomish", "Bothell"), 12),
    (("Pierce", "Tacoma"), 8),
    (("Clark", "Vancouver"), 6),
    (("Thurston", "Olympia"), 4),
    (("Kitsap", "Bremerton"), 3),
    (("Spokane", "Spokane"), 3),
    (("Whatcom", "Bellingham"), 2),
    (("Benton", "Kennewick"), 1),
    (("Island", "Oak Harbor"), 1),
    (("Skagit", "Mount Vernon"), 1),
];

const LAST_YEAR: i64 = 2024;

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = 5_000;
    let output_path = "Electric_Vehicle_Population_Data.csv";

    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    writer.write_record([
        "County",
        "City",
        "State",
        "Model Year",
        "Make",
        "Model",
        "Electric Vehicle Type",
        "Electric Range",
        "Base MSRP",
    ])?;

    for _ in 0..rows {
        let model = rng.weighted(MODELS);
        let (county, city) = *rng.weighted(COUNTIES);
        let span = (LAST_YEAR - model.first_year + 1) as usize;
        let year = model.first_year + rng.below(span) as i64;

        let ev_type = if model.phev {
            "Plug-in Hybrid Electric Vehicle (PHEV)"
        } else {
            "Battery Electric Vehicle (BEV)"
        };
        // Newer registrations often lack a reported range, like the real file.
        let range = if year >= 2023 && rng.below(3) > 0 {
            String::new()
        } else {
            model.range.to_string()
        };

        let year = year.to_string();
        let msrp = model.msrp.to_string();
        writer.write_record([
            county,
            city,
            "WA",
            year.as_str(),
            model.make,
            model.model,
            ev_type,
            range.as_str(),
            msrp.as_str(),
        ])?;
    }
    writer.flush()?;

    println!("Wrote {rows} vehicles to {output_path}");
    Ok(())
}
