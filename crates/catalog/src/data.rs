use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// The static provider catalog: providers offering services, each service
/// offering plans priced per billing cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub currency: String,
    pub providers: Vec<Provider>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub plans: Vec<Plan>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: String,
    pub label: String,
    /// Billing cycle name to price. Typed prices make malformed amounts
    /// unrepresentable here.
    pub billing: BTreeMap<String, Decimal>,
}

fn plan(id: &str, label: &str, cycle: &str, price: u32) -> Plan {
    Plan {
        id: id.to_string(),
        label: label.to_string(),
        billing: BTreeMap::from([(cycle.to_string(), Decimal::from(price))]),
    }
}

/// The built-in catalog served to customers and used for order pricing.
pub fn builtin() -> Catalog {
    Catalog {
        currency: "USD".to_string(),
        providers: vec![
            Provider {
                id: "render".to_string(),
                name: "Render".to_string(),
                category: "hosting".to_string(),
                description: "Managed hosting for web services and APIs.".to_string(),
                services: vec![Service {
                    id: "managed-web-hosting".to_string(),
                    name: "Managed Web Hosting".to_string(),
                    description: "Deploy frontend and backend apps with managed infrastructure."
                        .to_string(),
                    plans: vec![
                        plan("starter", "Starter", "monthly", 7),
                        plan("pro", "Pro", "monthly", 25),
                        plan("team", "Team", "monthly", 85),
                    ],
                }],
            },
            Provider {
                id: "dynadot".to_string(),
                name: "Dynadot".to_string(),
                category: "domain".to_string(),
                description: "Domain registration and DNS management with API access.".to_string(),
                services: vec![Service {
                    id: "domain-registration".to_string(),
                    name: "Domain Registration".to_string(),
                    description: "Register and connect a domain with DNS controls.".to_string(),
                    plans: vec![
                        plan("dot-com", "Single Domain", "yearly", 14),
                        plan("dot-net", "Business Domain", "yearly", 16),
                        plan("dot-org", "Organization Domain", "yearly", 13),
                    ],
                }],
            },
            Provider {
                id: "supabase".to_string(),
                name: "Supabase".to_string(),
                category: "database".to_string(),
                description: "Postgres database, auth, and storage backend.".to_string(),
                services: vec![Service {
                    id: "managed-postgres".to_string(),
                    name: "Managed Postgres".to_string(),
                    description: "Hosted Postgres with auth and API helpers.".to_string(),
                    plans: vec![
                        plan("free", "Free", "monthly", 0),
                        plan("pro", "Pro", "monthly", 25),
                        plan("team", "Team", "monthly", 99),
                    ],
                }],
            },
            Provider {
                id: "neon".to_string(),
                name: "Neon".to_string(),
                category: "database".to_string(),
                description: "Serverless PostgreSQL for production apps.".to_string(),
                services: vec![Service {
                    id: "serverless-postgres".to_string(),
                    name: "Serverless PostgreSQL".to_string(),
                    description: "Auto-scaling Postgres with branching workflows.".to_string(),
                    plans: vec![
                        plan("launch", "Launch", "monthly", 19),
                        plan("scale", "Scale", "monthly", 69),
                    ],
                }],
            },
        ],
    }
}
