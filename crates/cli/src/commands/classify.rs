//! `ragctx classify` — Show which retrieval path a query takes.

use ragctx_retrieval::FilenameQuery;

pub fn run(query: &str) -> Result<(), Box<dyn std::error::Error>> {
    match FilenameQuery::parse(query) {
        Some(filename) => {
            println!("Filename search: yes");
            println!("   Normalized:  {}", filename.normalized);
            println!("   Name filter: {}", filename.name_filter);
        }
        None => println!("Filename search: no (general search)"),
    }
    Ok(())
}
