use serde::{Deserialize, Serialize};

use crate::domain::buyer::{Buyer, BuyerId};
use crate::domain::supplier::{Supplier, SupplierId};

/// How fruit labels are compared when linking buyers and suppliers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Byte-for-byte equality; `Mango` and `mango` do not match.
    #[default]
    Exact,
    /// Trimmed, lowercased comparison.
    Normalized,
}

impl MatchPolicy {
    pub fn same_fruit(&self, left: &str, right: &str) -> bool {
        match self {
            Self::Exact => left == right,
            Self::Normalized => left.trim().to_lowercase() == right.trim().to_lowercase(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Matcher {
    policy: MatchPolicy,
}

impl Matcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Fruits of `subject` that also appear in `other`, in `subject` order.
    pub fn shared_fruits(&self, subject: &[String], other: &[String]) -> Vec<String> {
        subject
            .iter()
            .filter(|fruit| other.iter().any(|candidate| self.policy.same_fruit(fruit, candidate)))
            .cloned()
            .collect()
    }

    fn overlaps(&self, left: &[String], right: &[String]) -> bool {
        left.iter().any(|fruit| right.iter().any(|candidate| self.policy.same_fruit(fruit, candidate)))
    }

    pub fn match_suppliers<'a>(&self, buyer: &Buyer, suppliers: &'a [Supplier]) -> Vec<&'a Supplier> {
        suppliers
            .iter()
            .filter(|supplier| self.overlaps(&supplier.fruits_offered, &buyer.fruits_interested))
            .collect()
    }

    pub fn match_buyers<'a>(&self, supplier: &Supplier, buyers: &'a [Buyer]) -> Vec<&'a Buyer> {
        buyers
            .iter()
            .filter(|buyer| self.overlaps(&buyer.fruits_interested, &supplier.fruits_offered))
            .collect()
    }

    /// Every supplier to buyer pair with at least one shared fruit, weighted by
    /// the number of shared fruits. Buyers are the outer loop.
    pub fn trade_links(&self, suppliers: &[Supplier], buyers: &[Buyer]) -> Vec<TradeLink> {
        let mut links = Vec::new();
        for buyer in buyers {
            for supplier in suppliers {
                let fruits = self.shared_fruits(&buyer.fruits_interested, &supplier.fruits_offered);
                if fruits.is_empty() {
                    continue;
                }
                links.push(TradeLink {
                    supplier_id: supplier.id.clone(),
                    buyer_id: buyer.id.clone(),
                    weight: fruits.len(),
                    fruits,
                });
            }
        }
        links
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeLink {
    pub supplier_id: SupplierId,
    pub buyer_id: BuyerId,
    pub fruits: Vec<String>,
    pub weight: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_average(average_reliability: f64) -> Self {
        if average_reliability > 90.0 {
            Self::Low
        } else if average_reliability > 75.0 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeRisk {
    pub level: RiskLevel,
    pub average_reliability: f64,
    pub matched_suppliers: usize,
}

/// Aggregate risk for a buyer from its matched suppliers. Missing reliability
/// scores count as zero; no matches is an average of zero.
pub fn trade_risk(matched: &[&Supplier]) -> TradeRisk {
    let average_reliability = if matched.is_empty() {
        0.0
    } else {
        let total: f64 =
            matched.iter().map(|supplier| f64::from(supplier.reliability.unwrap_or(0))).sum();
        total / matched.len() as f64
    };

    TradeRisk {
        level: RiskLevel::from_average(average_reliability),
        average_reliability,
        matched_suppliers: matched.len(),
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::buyer::{BuyerDraft, BuyerId};
    use crate::domain::supplier::{Supplier, SupplierDraft, SupplierId};

    use super::{trade_risk, MatchPolicy, Matcher, RiskLevel};

    fn supplier(id: &str, fruits: &[&str], reliability: Option<u8>) -> Supplier {
        let mut draft = SupplierDraft::new(
            format!("Supplier {id}"),
            "Colombia",
            fruits.iter().map(|fruit| fruit.to_string()).collect(),
        );
        draft.reliability = reliability;
        draft.into_supplier(SupplierId(id.to_string())).expect("valid supplier")
    }

    fn buyer(id: &str, fruits: &[&str]) -> crate::domain::buyer::Buyer {
        BuyerDraft::new(
            format!("Buyer {id}"),
            "Spain",
            fruits.iter().map(|fruit| fruit.to_string()).collect(),
        )
        .into_buyer(BuyerId(id.to_string()))
        .expect("valid buyer")
    }

    #[test]
    fn banana_buyer_matches_banana_mango_supplier() {
        let matcher = Matcher::default();
        let buyer = buyer("b1", &["banana"]);
        let suppliers = vec![supplier("s1", &["banana", "mango"], Some(90))];

        let matched = matcher.match_suppliers(&buyer, &suppliers);
        assert_eq!(matched.len(), 1);
        assert_eq!(
            matcher.shared_fruits(&matched[0].fruits_offered, &buyer.fruits_interested),
            vec!["banana"]
        );
    }

    #[test]
    fn match_result_is_ordered_subset_with_overlap() {
        let matcher = Matcher::default();
        let buyer = buyer("b1", &["limes", "raspberry"]);
        let suppliers = vec![
            supplier("s1", &["raspberry"], Some(85)),
            supplier("s2", &["banana"], Some(90)),
            supplier("s3", &["apple", "limes"], Some(88)),
        ];

        let matched = matcher.match_suppliers(&buyer, &suppliers);
        let ids = matched.iter().map(|supplier| supplier.id.0.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["s1", "s3"]);
    }

    #[test]
    fn matching_is_bidirectional() {
        let matcher = Matcher::default();
        let supplier = supplier("s1", &["banana"], Some(90));
        let buyers = vec![buyer("b1", &["banana", "mango"]), buyer("b2", &["limes"])];

        let matched = matcher.match_buyers(&supplier, &buyers);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id.0, "b1");
    }

    #[test]
    fn exact_policy_ignores_case_mismatches_but_normalized_does_not() {
        let buyer = buyer("b1", &["Mango"]);
        let suppliers = vec![supplier("s1", &["mango "], Some(80))];

        assert!(Matcher::new(MatchPolicy::Exact).match_suppliers(&buyer, &suppliers).is_empty());
        assert_eq!(Matcher::new(MatchPolicy::Normalized).match_suppliers(&buyer, &suppliers).len(), 1);
    }

    #[test]
    fn risk_thresholds_are_monotonic() {
        let low = supplier("s1", &["banana"], Some(95));
        let medium = supplier("s2", &["banana"], Some(80));
        let high = supplier("s3", &["banana"], Some(50));

        assert_eq!(trade_risk(&[&low]).level, RiskLevel::Low);
        assert_eq!(trade_risk(&[&medium]).level, RiskLevel::Medium);
        assert_eq!(trade_risk(&[&high]).level, RiskLevel::High);
        assert_eq!(trade_risk(&[]).level, RiskLevel::High);
        assert_eq!(trade_risk(&[]).average_reliability, 0.0);
    }

    #[test]
    fn boundary_values_fall_to_the_riskier_band() {
        let ninety = supplier("s1", &["banana"], Some(90));
        let seventy_five = supplier("s2", &["banana"], Some(75));
        let unknown = supplier("s3", &["banana"], None);

        assert_eq!(trade_risk(&[&ninety]).level, RiskLevel::Medium);
        assert_eq!(trade_risk(&[&seventy_five]).level, RiskLevel::High);

        let mixed = trade_risk(&[&ninety, &unknown]);
        assert_eq!(mixed.average_reliability, 45.0);
        assert_eq!(mixed.level, RiskLevel::High);
    }

    #[test]
    fn trade_links_weight_by_shared_fruit_count() {
        let matcher = Matcher::default();
        let suppliers =
            vec![supplier("s1", &["banana", "mango"], Some(90)), supplier("s2", &["limes"], None)];
        let buyers = vec![buyer("b1", &["mango", "banana"]), buyer("b2", &["durian"])];

        let links = matcher.trade_links(&suppliers, &buyers);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].supplier_id.0, "s1");
        assert_eq!(links[0].buyer_id.0, "b1");
        assert_eq!(links[0].fruits, vec!["mango", "banana"]);
        assert_eq!(links[0].weight, 2);
    }
}
