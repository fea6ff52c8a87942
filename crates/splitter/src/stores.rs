use colored::Colorize;
use prettytable::row;

use order_splitter_core::store::Store;

use crate::prelude::{println, *};

pub fn run(global: crate::Global) -> Result<()> {
    let mut table = new_table();
    table.add_row(row![b -> "Store", b -> "Labels"]);
    for store in Store::ALL {
        table.add_row(row![store.display_name().bright_cyan(), store_labels(store)]);
    }
    table.printstd();

    if global.verbose {
        println!(
            "\nEvery store also matches any alphanumeric token of {} or more characters.",
            "four".bold()
        );
    }

    Ok(())
}

fn store_labels(store: Store) -> String {
    store.labels().join(", ")
}
