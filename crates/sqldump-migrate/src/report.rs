//! Markdown description of a schema document.

use crate::model::SchemaDocument;

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "YES"
    } else {
        "NO"
    }
}

/// Render the document's tables, in emission order, as markdown.
pub fn render_markdown(doc: &SchemaDocument) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Inferred schema ({} tables)\n\n", doc.len()));
    if !doc.is_empty() {
        output.push_str(&format!(
            "**Creation order:** {}\n\n",
            doc.emission_order().join(", ")
        ));
    }

    for table in doc.ordered_tables() {
        output.push_str(&format!("## Table: {}\n", table.name));
        output.push_str("| Column | Type | Nullable | Key | Indexed |\n");
        output.push_str("|---|---|---|---|---|\n");
        for col in &table.columns {
            let key = if col.is_primary_key || table.primary_key.contains(&col.name) {
                "PK"
            } else {
                ""
            };
            output.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                col.name,
                col.storage_type,
                yes_no(col.nullable),
                key,
                yes_no(col.is_indexed)
            ));
        }

        if table.has_composite_pk() {
            output.push_str(&format!(
                "\n**Composite Key:** {}\n",
                table.primary_key.join(", ")
            ));
        }
        output.push_str("\n---\n\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifications;
    use crate::config::Config;
    use crate::model::SchemaBuilder;
    use crate::scanner::DiscoveredSchema;

    #[test]
    fn test_render_markdown() {
        let mut schema = DiscoveredSchema::new();
        schema.insert("knowledge_tags", vec!["knowledge_id".into(), "tag_id".into()]);
        schema.insert("users", vec!["user_id".into(), "insert_datetime".into()]);
        let doc = SchemaBuilder::new(&Config::default())
            .build(&schema, &Classifications::new())
            .unwrap();

        let md = render_markdown(&doc);
        assert!(md.starts_with("# Inferred schema (2 tables)\n"));
        assert!(md.contains("**Creation order:** users, knowledge_tags"));
        assert!(md.contains("## Table: users\n| Column | Type | Nullable | Key | Indexed |"));
        assert!(md.contains("| user_id | bigint | NO | PK | NO |"));
        assert!(md.contains("| insert_datetime | timestamp | NO |  | NO |"));
        assert!(md.contains("| tag_id | integer | YES | PK | YES |"));
        assert!(md.contains("**Composite Key:** knowledge_id, tag_id"));
        assert!(md.find("## Table: users").unwrap() < md.find("## Table: knowledge_tags").unwrap());
    }
}
