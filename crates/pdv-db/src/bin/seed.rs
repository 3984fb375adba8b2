//! # Seed Data Generator
//!
//! Populates the database with test products and customers for development.
//!
//! ## Usage
//! ```bash
//! # Seed with defaults
//! cargo run -p pdv-db --bin seed
//!
//! # Custom product count and database path
//! cargo run -p pdv-db --bin seed -- --count 500 --db ./data/pdv.db
//! ```
//!
//! ## Generated Data
//! - Products across grocery categories with SKU `{CATEGORY}-{INDEX}`,
//!   prices between R$0,99 and R$49,99 and stock between 0 and 100
//! - A handful of customers with varied fiado limits, store credit and
//!   loyalty points, so every checkout path is exercisable

use chrono::Utc;
use std::env;
use uuid::Uuid;

use pdv_core::{Customer, Product};
use pdv_db::{Database, DbConfig};

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "BEB",
        &[
            "Coca-Cola 2L",
            "Guaraná Antarctica 2L",
            "Suco de Laranja 1L",
            "Água Mineral 500ml",
            "Cerveja Brahma Lata",
            "Café Pilão 500g",
            "Leite Integral 1L",
            "Refrigerante Fanta 2L",
            "Chá Mate 1,5L",
            "Energético 250ml",
        ],
    ),
    (
        "MER",
        &[
            "Arroz Branco 5kg",
            "Feijão Carioca 1kg",
            "Açúcar Cristal 2kg",
            "Óleo de Soja 900ml",
            "Macarrão Espaguete 500g",
            "Farinha de Trigo 1kg",
            "Sal Refinado 1kg",
            "Molho de Tomate 340g",
            "Sardinha em Lata",
            "Milho Verde em Lata",
        ],
    ),
    (
        "LIM",
        &[
            "Detergente 500ml",
            "Sabão em Pó 1kg",
            "Água Sanitária 1L",
            "Amaciante 2L",
            "Esponja de Aço",
            "Desinfetante 500ml",
            "Papel Higiênico 4un",
            "Sabonete 90g",
            "Shampoo 350ml",
            "Creme Dental 90g",
        ],
    ),
    (
        "PAD",
        &[
            "Pão Francês kg",
            "Pão de Forma",
            "Bolo de Fubá",
            "Biscoito Recheado",
            "Rosquinha de Coco",
            "Torrada Integral",
            "Queijo Mussarela kg",
            "Presunto kg",
            "Margarina 500g",
            "Requeijão 200g",
        ],
    ),
];

/// Deterministic pseudo-random from an index (no rand dependency needed
/// for seed data).
fn scatter(i: usize, range: i64) -> i64 {
    ((i as i64).wrapping_mul(2654435761) >> 8).rem_euclid(range)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let count = arg_value(&args, "--count")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(200);
    let db_path = arg_value(&args, "--db").unwrap_or_else(|| "./data/pdv.db".to_string());

    println!("Seeding {count} products into {db_path}");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let now = Utc::now();

    let mut inserted = 0usize;
    'outer: for round in 0usize.. {
        for (category, names) in CATEGORIES.iter() {
            for (name_idx, name) in names.iter().enumerate() {
                if inserted >= count {
                    break 'outer;
                }
                let i = inserted;
                let suffix = if round == 0 {
                    String::new()
                } else {
                    format!(" #{round}")
                };

                let product = Product {
                    id: Uuid::new_v4().to_string(),
                    sku: format!("{category}-{round:02}{name_idx:02}"),
                    name: format!("{name}{suffix}"),
                    // R$0,99 - R$49,99
                    price_centavos: 99 + scatter(i, 4_900),
                    stock_quantity: scatter(i + 7, 101),
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                };
                db.products().insert(&product).await?;
                inserted += 1;
            }
        }
    }

    let customers = [
        ("João Pereira", 20_000, 0, 100, 0),
        ("Maria Silva", 10_000, 5_000, 30, 2_500),
        ("Carlos Souza", 0, 0, 0, 10_000),
        ("Ana Costa", 50_000, 12_000, 250, 0),
    ];
    for (name, limit, outstanding, points, credit) in customers {
        db.customers()
            .insert(&Customer {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                credit_limit_fiado_centavos: limit,
                outstanding_fiado_centavos: outstanding,
                loyalty_points: points,
                store_credit_centavos: credit,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    println!("Seeded {inserted} products and {} customers", customers.len());
    Ok(())
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
