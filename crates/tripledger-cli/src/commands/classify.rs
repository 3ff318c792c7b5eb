//! Classify command

use crate::app::ClassifyArgs;
use anyhow::Result;
use tripledger_core::CategoryClassifier;

pub async fn run(args: ClassifyArgs) -> Result<()> {
    let classifier = CategoryClassifier::new();
    let name = args.name.join(" ");

    let category = classifier.classify(&name);
    match classifier.subcategory(&name, category) {
        Some(subcategory) => println!("{} / {}", category.as_str(), subcategory),
        None => println!("{}", category.as_str()),
    }
    Ok(())
}
