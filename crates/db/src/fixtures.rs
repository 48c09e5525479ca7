//! Demo directory loaded at startup: four suppliers and four buyers with
//! fixed ids `1`..`4`.

use rust_decimal::Decimal;

use fruitlink_core::domain::buyer::{Buyer, BuyerId, Volume};
use fruitlink_core::domain::price::{PriceRange, PriceTable};
use fruitlink_core::domain::supplier::{Supplier, SupplierId};

pub struct SeedDataset {
    pub suppliers: Vec<Supplier>,
    pub buyers: Vec<Buyer>,
}

impl SeedDataset {
    pub fn demo() -> Self {
        Self { suppliers: seed_suppliers(), buyers: seed_buyers() }
    }
}

// Prices are given in cents.
fn table(entries: &[(&str, i64, i64, &str)]) -> PriceTable {
    entries
        .iter()
        .map(|(fruit, min, max, currency)| {
            (fruit.to_string(), PriceRange::new(Decimal::new(*min, 2), Decimal::new(*max, 2), *currency))
        })
        .collect()
}

fn labels(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

struct SupplierSeed {
    id: &'static str,
    name: &'static str,
    country: &'static str,
    fruits: &'static [&'static str],
    certifications: &'static [&'static str],
    email: &'static str,
    phone: &'static str,
    description: &'static str,
    prices: &'static [(&'static str, i64, i64, &'static str)],
    reliability: u8,
    established: i32,
}

const SUPPLIERS: &[SupplierSeed] = &[
    SupplierSeed {
        id: "1",
        name: "PT Nusantara Segar Abadi",
        country: "Indonesia",
        fruits: &["banana"],
        certifications: &["GLOBALG.A.P", "Organic", "Fair Trade"],
        email: "info@nusantarasegarabadi.com",
        phone: "+62-21-0000-0001",
        description: "Leading Indonesian banana supplier",
        prices: &[("banana", 120, 200, "USD")],
        reliability: 90,
        established: 2010,
    },
    SupplierSeed {
        id: "2",
        name: "Colombian Fruits and Minerals",
        country: "Colombia",
        fruits: &["limes", "apple"],
        certifications: &["GLOBALG.A.P", "BRC", "Rainforest Alliance"],
        email: "info@colombianfruits.com",
        phone: "+57-1-0000-0002",
        description: "Colombian exporter of fresh limes",
        prices: &[("limes", 80, 150, "USD")],
        reliability: 88,
        established: 2012,
    },
    SupplierSeed {
        id: "3",
        name: "Vitassous",
        country: "Colombia",
        fruits: &["raspberry"],
        certifications: &["GLOBALG.A.P", "Organic", "IFS"],
        email: "info@vitassous.com",
        phone: "+57-1-0000-0003",
        description: "Colombian raspberry supplier",
        prices: &[("raspberry", 250, 400, "USD")],
        reliability: 85,
        established: 2015,
    },
    SupplierSeed {
        id: "4",
        name: "Truong Ton",
        country: "Vietnam",
        fruits: &["banana"],
        certifications: &["GLOBALG.A.P", "HACCP"],
        email: "info@truongton.vn",
        phone: "+84-28-0000-0004",
        description: "Vietnamese banana exporter",
        prices: &[("banana", 110, 190, "USD")],
        reliability: 87,
        established: 2011,
    },
];

struct BuyerSeed {
    id: &'static str,
    name: &'static str,
    country: &'static str,
    fruits: &'static [&'static str],
    certifications: &'static [&'static str],
    email: &'static str,
    phone: &'static str,
    description: &'static str,
    budget: &'static [(&'static str, i64, i64, &'static str)],
    volume: Volume,
    established: i32,
}

const BUYERS: &[BuyerSeed] = &[
    BuyerSeed {
        id: "1",
        name: "PT Sewu Segar Nusantara",
        country: "Indonesia",
        fruits: &["banana", "mango"],
        certifications: &["GLOBALG.A.P", "Fair Trade"],
        email: "buyer@sewusegar.com",
        phone: "+62-21-1000-0001",
        description: "Indonesian buyer of bananas",
        budget: &[("banana", 130, 220, "USD")],
        volume: Volume::Large,
        established: 2008,
    },
    BuyerSeed {
        id: "2",
        name: "Hacienda Sotomayor SL",
        country: "Spain",
        fruits: &["limes"],
        certifications: &["Organic", "BRC"],
        email: "buyer@haciendasotomayor.es",
        phone: "+34-91-000-0002",
        description: "Spanish buyer of limes",
        budget: &[("limes", 100, 180, "EUR")],
        volume: Volume::Medium,
        established: 2010,
    },
    BuyerSeed {
        id: "3",
        name: "BAN CHOON MARKETING PTE LTD",
        country: "Singapore",
        fruits: &["raspberry"],
        certifications: &["IFS", "GLOBALG.A.P"],
        email: "buyer@banchoon.com.sg",
        phone: "+65-6000-0003",
        description: "Singaporean buyer of raspberries and blueberries",
        budget: &[("raspberry", 280, 450, "USD"), ("blueberry", 300, 500, "USD")],
        volume: Volume::Medium,
        established: 2005,
    },
    BuyerSeed {
        id: "4",
        name: "Wismettac",
        country: "Japan",
        fruits: &["banana"],
        certifications: &["GLOBALG.A.P", "SQF"],
        email: "buyer@wismettac.co.jp",
        phone: "+81-3-0000-0004",
        description: "Japanese buyer of bananas",
        budget: &[("banana", 140, 230, "USD")],
        volume: Volume::Large,
        established: 1995,
    },
];

pub fn seed_suppliers() -> Vec<Supplier> {
    SUPPLIERS
        .iter()
        .map(|seed| Supplier {
            id: SupplierId(seed.id.to_string()),
            name: seed.name.to_string(),
            location: seed.country.to_string(),
            country: seed.country.to_string(),
            fruits_offered: labels(seed.fruits),
            certifications: labels(seed.certifications),
            contact_email: seed.email.to_string(),
            contact_phone: seed.phone.to_string(),
            description: seed.description.to_string(),
            price_range: table(seed.prices),
            reliability: Some(seed.reliability),
            established: Some(seed.established),
        })
        .collect()
}

pub fn seed_buyers() -> Vec<Buyer> {
    BUYERS
        .iter()
        .map(|seed| Buyer {
            id: BuyerId(seed.id.to_string()),
            name: seed.name.to_string(),
            location: seed.country.to_string(),
            country: seed.country.to_string(),
            fruits_interested: labels(seed.fruits),
            certifications: labels(seed.certifications),
            contact_email: seed.email.to_string(),
            contact_phone: seed.phone.to_string(),
            description: seed.description.to_string(),
            budget_range: table(seed.budget),
            volume: seed.volume,
            established: Some(seed.established),
        })
        .collect()
}
