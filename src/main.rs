use std::collections::HashMap;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use career_sync::career::host::{AttributeError, AttributeModifiers, ResourceHolder, ResourceRegistry};
use career_sync::command::is_career_command;
use career_sync::sync::client::{attribute_label_key, CareerPicker};
use career_sync::sync::messages::CareerMessage;
use career_sync::sync::server::receive_or_log;
use career_sync::{
    CareerConfig, CareerHost, CareerServer, CareerStores, CompoundCareerStore, NamespacedId,
    Outbound, SqliteCareerStore, UserId,
};

/// Units a console user can hold before the rest is dropped beside them.
const HOLDING_CAPACITY: u32 = 16;

fn main() {
    println!("Initializing career server (headless demo)...");
    let (catalog_path, db_path) = parse_paths(env::args().collect());
    let config = CareerConfig::default().with_catalog_path(catalog_path);

    let stores = match db_path {
        Some(path) => match SqliteCareerStore::open(&path) {
            Ok(store) => CareerStores::new(store),
            Err(err) => {
                eprintln!("Failed to open career DB at {}: {}", path.display(), err);
                std::process::exit(1);
            }
        },
        None => CareerStores::new(CompoundCareerStore::new()),
    };

    let host = CareerHost::new(Box::new(ConsoleRegistry), Box::new(ConsoleHoldings::default()))
        .with_attributes(Box::new(ConsoleAttributes::default()));
    let mut server = CareerServer::new(&config, stores, host);
    println!(
        "Loaded {} careers from {} (locked after choice: {})",
        server.catalog().len(),
        config.catalog_path.display(),
        server.catalog().lock_after_choice()
    );

    let user = UserId(1);
    let network = server.inbound_handle();
    let mut picker = CareerPicker::new();

    server.connect(user);
    deliver(server.tick(), &mut picker);

    match CareerMessage::RequestSnapshot.encode() {
        Ok(frame) => receive_or_log(&network, user, frame),
        Err(err) => eprintln!("Cannot encode request: {}", err),
    }
    deliver(server.tick(), &mut picker);
    print_picker(&picker);

    if picker.can_navigate() {
        picker.next();
    }
    match picker.submit() {
        Some(Ok(frame)) => receive_or_log(&network, user, frame),
        Some(Err(err)) => eprintln!("Cannot encode choice: {}", err),
        None => println!("Nothing to submit."),
    }
    deliver(server.tick(), &mut picker);
    print_picker(&picker);

    println!("Operator console: type /career, or an empty line to finish.");
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            break;
        }
        if is_career_command(input) {
            println!("{:?}", server.run_command(user));
            deliver(server.drain_outbound(), &mut picker);
        } else {
            println!("Unknown command: {}", input);
        }
    }

    match server.record(user) {
        Ok(record) => println!(
            "Stored record: career={:?} items_granted={} bonuses={:?}",
            record.assigned(),
            record.items_granted(),
            record.applied_attributes()
        ),
        Err(err) => eprintln!("Record unavailable: {}", err),
    }
}

fn deliver(outbound: Vec<Outbound>, picker: &mut CareerPicker) {
    for message in outbound {
        match message {
            Outbound::Packet { user, payload } => match picker.receive(payload) {
                Ok(_) => println!("[{}] snapshot received", user),
                Err(err) => eprintln!("[{}] bad frame: {}", user, err),
            },
            Outbound::Notice { user, notice } => match notice.shortcut {
                Some(command) => println!("[{}] {} ({})", user, notice.text, command),
                None => println!("[{}] {}", user, notice.text),
            },
        }
    }
}

fn print_picker(picker: &CareerPicker) {
    println!("Careers (assigned: {}):", picker.selected_id().unwrap_or("none"));
    for (index, career) in picker.careers().iter().enumerate() {
        let marker = if index == picker.cursor() { ">" } else { " " };
        println!("{} {} [{}] {}", marker, career.name, career.icon, career.description);
        for bonus in &career.attributes {
            println!("    {} {:+}", attribute_label_key(&bonus.attribute_id), bonus.value);
        }
        for resource in &career.resources {
            println!("    {} x{}", resource.resource_id, resource.count);
        }
    }
}

fn parse_paths(args: Vec<String>) -> (PathBuf, Option<PathBuf>) {
    let mut iter = args.iter();
    let mut catalog_path = CareerConfig::default().catalog_path;
    let mut db_path = None;
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--catalog" => {
                if let Some(value) = iter.next() {
                    catalog_path = PathBuf::from(value);
                }
            }
            "--db" => {
                if let Some(value) = iter.next() {
                    db_path = Some(PathBuf::from(value));
                }
            }
            _ => {}
        }
    }
    (catalog_path, db_path)
}

struct ConsoleRegistry;

impl ResourceRegistry for ConsoleRegistry {
    fn contains(&self, _resource: &NamespacedId) -> bool {
        true
    }
}

#[derive(Default)]
struct ConsoleHoldings {
    held: HashMap<UserId, u32>,
}

impl ResourceHolder for ConsoleHoldings {
    fn insert(&mut self, user: UserId, resource: &NamespacedId, count: u32) -> u32 {
        let used = self.held.entry(user).or_default();
        let fits = count.min(HOLDING_CAPACITY.saturating_sub(*used));
        *used += fits;
        println!("  {} receives {} x{}", user, resource, fits);
        count - fits
    }

    fn drop_near(&mut self, user: UserId, resource: &NamespacedId, count: u32) {
        println!("  {} x{} dropped beside {}", resource, count, user);
    }
}

#[derive(Default)]
struct ConsoleAttributes {
    extras: HashMap<(UserId, NamespacedId), f64>,
}

impl AttributeModifiers for ConsoleAttributes {
    fn set_extra(
        &mut self,
        user: UserId,
        attribute: &NamespacedId,
        value: f64,
    ) -> Result<(), AttributeError> {
        println!("  {} gains {} {:+}", user, attribute, value);
        self.extras.insert((user, attribute.clone()), value);
        Ok(())
    }

    fn reset_extra(&mut self, user: UserId, attribute: &NamespacedId) -> Result<(), AttributeError> {
        match self.extras.remove(&(user, attribute.clone())) {
            Some(_) => {
                println!("  {} loses {}", user, attribute);
                Ok(())
            }
            None => Err(AttributeError::NotManaged(attribute.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_catalog_and_db_flags() {
        let (catalog, db) = parse_paths(args(&["career-sync", "--catalog", "c.json", "--db", "u.db"]));
        assert_eq!(catalog, PathBuf::from("c.json"));
        assert_eq!(db, Some(PathBuf::from("u.db")));
    }

    #[test]
    fn falls_back_to_defaults() {
        let (catalog, db) = parse_paths(args(&["career-sync", "--db"]));
        assert_eq!(catalog, CareerConfig::default().catalog_path);
        assert_eq!(db, None);
    }
}
