use std::io;
use std::io::Write;

use anyhow::Result;

use glyphdb_store::{GlyphDb, NewGlyph};

/// Prompt for a title and SVG markup on stdin, then create one glyph.
pub(crate) async fn run_seed_glyph(db: &GlyphDb) -> Result<()> {
    let title = ask("Title: ")?;
    let svg = ask("SVG markup: ")?;

    let glyph = db
        .add_glyph(NewGlyph {
            title,
            svg,
            ..Default::default()
        })
        .await?;

    println!("added gGlyph");
    println!("- id: {}", glyph.id);
    println!("- title: {}", glyph.title);
    Ok(())
}

fn ask(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
