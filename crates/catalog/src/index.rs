use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::Catalog;

/// Resolved price and display labels for one catalog plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedPlan {
    pub provider_name: String,
    pub service_name: String,
    pub plan_label: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CatalogKey {
    provider: String,
    service: String,
    plan: String,
    cycle: String,
}

impl CatalogKey {
    fn new(provider: &str, service: &str, plan: &str, cycle: &str) -> Self {
        Self {
            provider: provider.trim().to_lowercase(),
            service: service.trim().to_lowercase(),
            plan: plan.trim().to_lowercase(),
            cycle: cycle.trim().to_lowercase(),
        }
    }
}

/// Flattened lookup over the catalog, keyed by the case-insensitive
/// (provider, service, plan, billing cycle) tuple.
///
/// Pure function of the catalog with no side effects; cheap enough to
/// rebuild on every order submission.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: HashMap<CatalogKey, PricedPlan>,
}

impl CatalogIndex {
    pub fn build(catalog: &Catalog) -> Self {
        let mut entries = HashMap::new();
        for provider in &catalog.providers {
            for service in &provider.services {
                for plan in &service.plans {
                    for (cycle, price) in &plan.billing {
                        let key = CatalogKey::new(&provider.id, &service.id, &plan.id, cycle);
                        entries.insert(
                            key,
                            PricedPlan {
                                provider_name: provider.name.trim().to_string(),
                                service_name: service.name.trim().to_string(),
                                plan_label: plan.label.trim().to_string(),
                                price: *price,
                            },
                        );
                    }
                }
            }
        }
        Self { entries }
    }

    /// Build the index over the built-in catalog.
    pub fn builtin() -> Self {
        Self::build(&crate::builtin())
    }

    pub fn lookup(
        &self,
        provider_id: &str,
        service_id: &str,
        plan_id: &str,
        billing_cycle: &str,
    ) -> Option<&PricedPlan> {
        self.entries
            .get(&CatalogKey::new(provider_id, service_id, plan_id, billing_cycle))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
