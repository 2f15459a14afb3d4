// Example: Building queries without a database
// Run with: cargo run --example build_queries

use queex::{compile_filter, ConditionGroup, FieldCondition, Logical, MatchMode, Selection, SqlQuery};

fn main() -> anyhow::Result<()> {
    println!("=== queex Query Building Example ===\n");

    // 1. A MongoDB filter: case-insensitive substring match on "name"
    println!("1. MongoDB filter for name ~ 'kadek'...");
    let filter = compile_filter(
        &[FieldCondition::new("name", "kadek", MatchMode::Partial)],
        Logical::Or,
    )?;
    println!("{}\n", filter);

    // 2. Combining exact matches with AND
    println!("2. MongoDB filter with two exact matches...");
    let fields = vec![
        "NAMA_LGKP=ERNAWATI:exact".parse::<FieldCondition>()?,
        "ALAMAT=CIJAMBE:exact".parse::<FieldCondition>()?,
    ];
    println!("{}\n", compile_filter(&fields, Logical::And)?);

    // 3. A SELECT with two condition groups, decoded from JSON
    println!("3. MySQL statement with two condition groups...");
    let groups = vec![
        ConditionGroup::from_json(
            r#"{"conditions": [["logical", "or"], ["nama", ["riki", "contain"]]]}"#,
        )?,
        ConditionGroup::from_json(
            r#"{"logical": "and", "conditions": [["logical", "and"],
                ["nama", ["hidayat", "endswith"]], ["alamat", ["bandung", "equal"]]]}"#,
        )?,
    ];
    let statement = SqlQuery::build(
        &Selection::from(vec!["nama", "jenis_kelamin"]),
        "contact_person",
        &groups,
    )?;
    println!("{}", statement);

    // 4. What is actually sent: placeholders plus bound values
    println!("\n4. Prepared form...");
    println!("{}", statement.sql());
    println!("params: {:?}", statement.params());

    // 5. Invalid input is rejected before anything connects
    println!("\n5. Using a MySQL mode on MongoDB...");
    let bad = compile_filter(
        &[FieldCondition::new("name", "kadek", MatchMode::Contain)],
        Logical::Or,
    );
    match bad {
        Ok(_) => println!("unexpectedly accepted"),
        Err(e) => println!("{}", e),
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
