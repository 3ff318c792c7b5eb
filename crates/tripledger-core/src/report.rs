//! Plain-text expense summary
//!
//! A shareable report over a set of receipts: trip date range, counts,
//! totals per currency, category breakdown, and the priciest items.
//! Pure over its input; date filtering happens at the store.

use crate::models::{Category, Currency, Receipt};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;

const TOP_ITEMS: usize = 5;

/// Render the expense summary for a set of receipts
pub fn render_report(receipts: &[Receipt]) -> String {
    if receipts.is_empty() {
        return "No receipts recorded.\n".to_string();
    }

    let mut out = String::new();

    let first = receipts.iter().map(|r| r.timestamp.date()).min();
    let last = receipts.iter().map(|r| r.timestamp.date()).max();
    let item_count: usize = receipts.iter().map(|r| r.items.len()).sum();
    let stores: HashSet<&str> = receipts.iter().map(|r| r.store_name.as_str()).collect();

    match (first, last) {
        (Some(first), Some(last)) if first == last => {
            let _ = writeln!(out, "Expense report for {}", first);
        }
        (Some(first), Some(last)) => {
            let _ = writeln!(out, "Expense report {} to {}", first, last);
        }
        _ => {}
    }
    let _ = writeln!(
        out,
        "Receipts: {} | Items: {} | Stores: {}",
        receipts.len(),
        item_count,
        stores.len()
    );

    let mut by_currency: BTreeMap<Currency, Decimal> = BTreeMap::new();
    for receipt in receipts {
        *by_currency.entry(receipt.currency).or_insert(Decimal::ZERO) += receipt.total;
    }
    out.push_str("\nTotals by currency\n");
    for (currency, total) in &by_currency {
        let _ = writeln!(
            out,
            "  {:<4} {:>12}",
            currency.as_str(),
            format_amount(*total)
        );
    }

    // Category sums are raw numbers; a single-currency trip is assumed,
    // as the per-currency section above makes any mix visible.
    let mut by_category: BTreeMap<Category, Decimal> = BTreeMap::new();
    for receipt in receipts {
        for item in &receipt.items {
            if let Some(total) = item.total_price {
                *by_category.entry(item.category).or_insert(Decimal::ZERO) += total;
            }
        }
    }
    if !by_category.is_empty() {
        let mut sorted: Vec<(Category, Decimal)> = by_category.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        out.push_str("\nSpending by category\n");
        for (category, total) in &sorted {
            let _ = writeln!(
                out,
                "  {:<14} {:>12}",
                category.as_str(),
                format_amount(*total)
            );
        }
    }

    let mut priced: Vec<(&Receipt, &crate::models::Item, Decimal)> = receipts
        .iter()
        .flat_map(|receipt| {
            receipt
                .items
                .iter()
                .filter_map(move |item| item.total_price.map(|price| (receipt, item, price)))
        })
        .collect();
    priced.sort_by(|a, b| b.2.cmp(&a.2));
    if !priced.is_empty() {
        out.push_str("\nTop items\n");
        for (receipt, item, price) in priced.iter().take(TOP_ITEMS) {
            let name = item.name_translated.as_deref().unwrap_or(&item.name);
            let store = receipt
                .store_name_translated
                .as_deref()
                .unwrap_or(&receipt.store_name);
            let _ = writeln!(out, "  {:>12}  {} ({})", format_amount(*price), name, store);
        }
    }

    out
}

/// Group integer digits by thousands, keeping sign and any fraction
fn format_amount(amount: Decimal) -> String {
    let text = amount.normalize().to_string();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}
