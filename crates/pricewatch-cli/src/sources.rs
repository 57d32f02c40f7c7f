use anyhow::Context;
use pricewatch_core::{AppConfig, Field, SourceLayout};

/// Loads and validates the source layouts, then prints one line per source.
pub(crate) fn list_sources(config: &AppConfig) -> anyhow::Result<()> {
    let sources = pricewatch_core::load_sources(&config.sources_path).with_context(|| {
        format!(
            "failed to load source layouts from {}",
            config.sources_path.display()
        )
    })?;

    for layout in &sources.sources {
        println!("{}", describe_layout(layout));
    }
    Ok(())
}

/// `id: page=0 name=1 ... offer=-` with `*` marking required fields.
pub(crate) fn describe_layout(layout: &SourceLayout) -> String {
    let fields: Vec<String> = Field::ALL
        .iter()
        .map(|&field| {
            let position = layout
                .fields
                .position(field)
                .map_or_else(|| "-".to_string(), |p| p.to_string());
            let marker = if layout.is_required(field) { "*" } else { "" };
            format!("{field}{marker}={position}")
        })
        .collect();
    format!("{}: {}", layout.id, fields.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_layout_marks_required_and_unmapped_fields() {
        let sources = pricewatch_core::parse_sources(
            r"
sources:
  - id: rockbottom
    fields: { page: 0, name: 1, price: 2, brand: 3, url: 4 }
    required: [name]
",
        )
        .unwrap();
        assert_eq!(
            describe_layout(&sources.sources[0]),
            "rockbottom: page*=0 name*=1 price*=2 brand=3 url=4 offer=-"
        );
    }
}
