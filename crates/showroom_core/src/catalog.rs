//! crates/showroom_core/src/catalog.rs
//!
//! The built-in vehicle catalog and the side-by-side comparison.

use serde::Serialize;

use crate::domain::Car;
use crate::ports::CatalogSource;

//=========================================================================================
// StaticCatalog
//=========================================================================================

pub struct StaticCatalog {
    cars: Vec<Car>,
}

impl StaticCatalog {
    pub fn new(cars: Vec<Car>) -> Self {
        Self { cars }
    }

    /// Case-insensitive match on brand, model or "brand model".
    pub fn search(&self, term: &str) -> Vec<&Car> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.cars.iter().collect();
        }
        self.cars
            .iter()
            .filter(|car| car.display_name().to_lowercase().contains(&term))
            .collect()
    }

    pub fn by_brand(&self, brand: &str) -> Vec<&Car> {
        self.cars
            .iter()
            .filter(|car| car.brand.eq_ignore_ascii_case(brand))
            .collect()
    }

    /// Distinct brands in catalog order.
    pub fn brands(&self) -> Vec<&str> {
        let mut brands: Vec<&str> = Vec::new();
        for car in &self.cars {
            if !brands.contains(&car.brand.as_str()) {
                brands.push(&car.brand);
            }
        }
        brands
    }
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self::new(default_cars())
    }
}

impl CatalogSource for StaticCatalog {
    fn cars(&self) -> &[Car] {
        &self.cars
    }
}

#[allow(clippy::too_many_arguments)]
fn vehicle(
    id: &str,
    brand: &str,
    model: &str,
    year: u16,
    price: u32,
    horsepower: u32,
    torque: u32,
    max_speed: u32,
    acceleration: f32,
    weight: u32,
    engine: &str,
    transmission: &str,
    drivetrain: &str,
    fuel_type: &str,
    description: &str,
) -> Car {
    Car {
        id: id.to_string(),
        brand: brand.to_string(),
        model: model.to_string(),
        year,
        price,
        horsepower,
        torque,
        max_speed,
        acceleration,
        weight,
        engine: engine.to_string(),
        transmission: transmission.to_string(),
        drivetrain: drivetrain.to_string(),
        fuel_type: fuel_type.to_string(),
        description: description.to_string(),
        images: Vec::new(),
    }
}

pub fn default_cars() -> Vec<Car> {
    vec![
        vehicle(
            "porsche-911-turbo-s", "Porsche", "911 Turbo S", 2024, 230_400, 640, 800, 330, 2.7,
            1640, "3.7L Twin-Turbo Flat-6", "8-speed PDK", "AWD", "Gasoline",
            "The benchmark everyday supercar.",
        ),
        vehicle(
            "bmw-m4-competition", "BMW", "M4 Competition", 2024, 84_100, 503, 650, 290, 3.8,
            1725, "3.0L Twin-Turbo I6", "8-speed M Steptronic", "RWD", "Gasoline",
            "Track-bred coupe with a daily-driver cabin.",
        ),
        vehicle(
            "audi-rs-e-tron-gt", "Audi", "RS e-tron GT", 2024, 147_100, 637, 830, 250, 3.3,
            2347, "Dual Electric Motors", "2-speed Automatic", "AWD", "Electric",
            "Electric grand tourer with quattro grip.",
        ),
        vehicle(
            "mercedes-amg-gt", "Mercedes-AMG", "GT 63", 2024, 175_900, 577, 800, 315, 3.2,
            1970, "4.0L Twin-Turbo V8", "9-speed MCT", "AWD", "Gasoline",
            "Long-hood 2+2 with a hand-built V8.",
        ),
        vehicle(
            "tesla-model-s-plaid", "Tesla", "Model S Plaid", 2024, 89_990, 1020, 1420, 322, 2.1,
            2162, "Tri Electric Motors", "1-speed Direct Drive", "AWD", "Electric",
            "Four-door sedan with hypercar launches.",
        ),
        vehicle(
            "ferrari-296-gtb", "Ferrari", "296 GTB", 2024, 322_986, 819, 740, 330, 2.9,
            1470, "3.0L Twin-Turbo V6 Hybrid", "8-speed DCT", "RWD", "Plug-in Hybrid",
            "Mid-engine plug-in hybrid berlinetta.",
        ),
        vehicle(
            "porsche-taycan-turbo", "Porsche", "Taycan Turbo", 2024, 172_600, 871, 890, 260, 2.7,
            2295, "Dual Electric Motors", "2-speed Automatic", "AWD", "Electric",
            "Porsche's electric four-door sports car.",
        ),
    ]
}

//=========================================================================================
// Comparison
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub metric: &'static str,
    pub left: f64,
    pub right: f64,
    /// None on a tie.
    pub winner: Option<Side>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarComparison {
    pub left: Car,
    pub right: Car,
    pub rows: Vec<ComparisonRow>,
}

impl CarComparison {
    /// Number of metrics each side wins.
    pub fn score(&self) -> (usize, usize) {
        self.rows.iter().fold((0, 0), |(l, r), row| match row.winner {
            Some(Side::Left) => (l + 1, r),
            Some(Side::Right) => (l, r + 1),
            None => (l, r),
        })
    }
}

enum Better {
    Higher,
    Lower,
}

pub fn compare(left: &Car, right: &Car) -> CarComparison {
    let metrics: [(&'static str, fn(&Car) -> f64, Better); 6] = [
        ("price", |c| f64::from(c.price), Better::Lower),
        ("horsepower", |c| f64::from(c.horsepower), Better::Higher),
        ("torque", |c| f64::from(c.torque), Better::Higher),
        ("maxSpeed", |c| f64::from(c.max_speed), Better::Higher),
        ("acceleration", |c| f64::from(c.acceleration), Better::Lower),
        ("weight", |c| f64::from(c.weight), Better::Lower),
    ];

    let rows = metrics
        .into_iter()
        .map(|(metric, value, better)| {
            let (l, r) = (value(left), value(right));
            let winner = if l == r {
                None
            } else {
                let left_wins = match better {
                    Better::Higher => l > r,
                    Better::Lower => l < r,
                };
                Some(if left_wins { Side::Left } else { Side::Right })
            };
            ComparisonRow {
                metric,
                left: l,
                right: r,
                winner,
            }
        })
        .collect();

    CarComparison {
        left: left.clone(),
        right: right.clone(),
        rows,
    }
}
