use std::fs;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use cxo_crypto::ContentHasher;
use cxo_protocol::{Codec, Message, RegistryMsg};
use cxo_schema::{Registry, Value};
use serde::Serialize;
use serde_json::json;

use crate::cli::*;
use crate::config::CliConfig;
use crate::sample;

pub fn run_command(command: Command, config: &CliConfig) -> anyhow::Result<()> {
    match command {
        Command::Registry(args) => cmd_registry(args, config),
        Command::Size(args) => cmd_size(args, config),
        Command::Message(args) => cmd_message(args, config),
        Command::Sample(args) => cmd_sample(args),
        Command::Config => cmd_config(config),
    }
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn print_json<T: Serialize>(report: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

// ---------------------------------------------------------------
// registry
// ---------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct RegistryReport {
    pub reference: String,
    pub schemas: Vec<SchemaEntry>,
}

#[derive(Debug, Serialize)]
pub struct SchemaEntry {
    pub name: String,
    pub reference: String,
    pub kind: String,
    pub schema: String,
}

pub fn registry_report(bytes: &[u8]) -> anyhow::Result<RegistryReport> {
    let registry = Registry::decode(bytes).context("decoding registry")?;
    let schemas = registry
        .schemas()
        .map(|view| SchemaEntry {
            name: view.name().unwrap_or_default().to_string(),
            reference: view.schema_ref().to_hex(),
            kind: view.kind().to_string(),
            schema: view.to_string(),
        })
        .collect();
    Ok(RegistryReport {
        reference: registry.reference().to_hex(),
        schemas,
    })
}

fn cmd_registry(args: RegistryArgs, config: &CliConfig) -> anyhow::Result<()> {
    let report = registry_report(&read(&args.path)?)?;
    if config.format == OutputFormat::Json {
        return print_json(&report);
    }
    println!("Registry {}", report.reference.yellow().bold());
    println!("  {} schemas", report.schemas.len().to_string().bold());
    for entry in &report.schemas {
        println!(
            "  {}  {}  {}",
            entry.reference[..8].dimmed(),
            entry.kind.cyan(),
            entry.schema
        );
    }
    Ok(())
}

// ---------------------------------------------------------------
// size
// ---------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SizeReport {
    pub schema: String,
    pub size: usize,
    pub data_len: usize,
    pub exact: bool,
    pub fields: Vec<FieldSize>,
}

#[derive(Debug, Serialize)]
pub struct FieldSize {
    pub name: String,
    pub kind: String,
    pub size: usize,
}

pub fn size_report(registry: &[u8], schema: &str, data: &[u8]) -> anyhow::Result<SizeReport> {
    let registry = Registry::decode(registry).context("decoding registry")?;
    let view = registry.schema_by_name(schema)?;
    let size = view.size(data).with_context(|| format!("measuring data as {schema}"))?;

    let mut fields = Vec::new();
    if view.field_count() > 0 {
        Value::new(view, data).range_fields(|name, value| -> anyhow::Result<()> {
            fields.push(FieldSize {
                name: name.to_string(),
                kind: value.kind().to_string(),
                size: value.data()?.len(),
            });
            Ok(())
        })?;
    }
    Ok(SizeReport {
        schema: view.to_string(),
        size,
        data_len: data.len(),
        exact: size == data.len(),
        fields,
    })
}

fn cmd_size(args: SizeArgs, config: &CliConfig) -> anyhow::Result<()> {
    let report = size_report(&read(&args.registry)?, &args.schema, &read(&args.data)?)?;
    if config.format == OutputFormat::Json {
        return print_json(&report);
    }
    println!("{}", report.schema.bold());
    let status = if report.exact {
        "exact".green()
    } else {
        format!("{} trailing bytes", report.data_len - report.size).yellow()
    };
    println!("  size {} of {} bytes ({status})", report.size, report.data_len);
    for field in &report.fields {
        println!("  {:<16} {:<10} {}", field.name, field.kind.cyan(), field.size);
    }
    Ok(())
}

// ---------------------------------------------------------------
// message
// ---------------------------------------------------------------

pub fn message_report(bytes: &[u8], codec: &Codec) -> anyhow::Result<serde_json::Value> {
    let msg = codec.decode(bytes).with_context(|| match Codec::peek_type(bytes) {
        Ok(msg_type) => format!("decoding {msg_type} message"),
        Err(_) => "decoding message".to_string(),
    })?;
    let details = match &msg {
        Message::Ping(_) | Message::Pong(_) => json!({}),
        Message::JoinFeed(m) => json!({ "feed": m.feed.to_hex() }),
        Message::LeaveFeed(m) => json!({ "feed": m.feed.to_hex() }),
        Message::Root(m) => json!({
            "feed": m.feed.to_hex(),
            "seq": m.root.seq,
            "hash": m.root.hash.to_hex(),
            "prev": m.root.prev.to_hex(),
            "root_len": m.root.root.len(),
            "sig_len": m.root.sig.len(),
        }),
        Message::RequestData(m) => json!({ "reference": m.reference.to_hex() }),
        Message::Data(m) => json!({
            "len": m.data.len(),
            "reference": ContentHasher::object_ref(&m.data).to_hex(),
        }),
        Message::RequestRegistry(m) => json!({ "reference": m.reference.to_hex() }),
        Message::Registry(m) => {
            let registry = Registry::decode(&m.registry).context("decoding carried registry")?;
            json!({
                "reference": registry.reference().to_hex(),
                "schemas": registry.names().collect::<Vec<_>>(),
            })
        }
    };
    Ok(json!({
        "type": msg.msg_type().to_string(),
        "code": msg.msg_type().code(),
        "size": bytes.len(),
        "details": details,
    }))
}

fn cmd_message(args: MessageArgs, config: &CliConfig) -> anyhow::Result<()> {
    let codec = Codec::new(config.max_message_size);
    let report = message_report(&read(&args.path)?, &codec)?;
    if config.format == OutputFormat::Json {
        return print_json(&report);
    }
    println!(
        "{} ({} bytes)",
        report["type"].as_str().unwrap_or_default().yellow().bold(),
        report["size"]
    );
    if let Some(details) = report["details"].as_object() {
        for (key, value) in details {
            println!("  {key}: {value}");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------
// sample / config
// ---------------------------------------------------------------

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let registry = sample::registry()?;
    let encoded = registry.encode();
    let message = Message::from(RegistryMsg {
        registry: encoded.clone(),
    })
    .encode()?;

    fs::create_dir_all(&args.dir)
        .with_context(|| format!("creating {}", args.dir.display()))?;
    let files = [
        ("registry.bin", encoded),
        ("user.bin", sample::user("alice", 30, &["admin", "ops"])),
        ("message.bin", message),
    ];
    for (name, bytes) in files {
        let path = args.dir.join(name);
        fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        println!("{} wrote {}", "✓".green(), path.display());
    }
    println!("  registry {}", registry.reference().to_hex().yellow());
    Ok(())
}

fn cmd_config(config: &CliConfig) -> anyhow::Result<()> {
    match config.format {
        OutputFormat::Json => print_json(config),
        OutputFormat::Text => {
            print!("{}", toml::to_string(config)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxo_protocol::{DataMsg, PingMsg};

    #[test]
    fn registry_report_lists_sorted_schemas() {
        let encoded = sample::registry().unwrap().encode();
        let report = registry_report(&encoded).unwrap();
        let names: Vec<_> = report.schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec![sample::GROUP, sample::USER]);
        assert_eq!(report.reference.len(), 64);
        assert!(report.schemas[0].schema.contains("Members []*cxo.User"));
    }

    #[test]
    fn registry_report_rejects_garbage() {
        assert!(registry_report(&[1, 2, 3]).is_err());
    }

    #[test]
    fn size_report_walks_fields() {
        let encoded = sample::registry().unwrap().encode();
        let mut data = sample::user("bob", 7, &["x"]);
        let len = data.len();
        data.push(0xff);

        let report = size_report(&encoded, sample::USER, &data).unwrap();
        assert_eq!(report.size, len);
        assert!(!report.exact);
        let sizes: Vec<_> = report.fields.iter().map(|f| f.size).collect();
        assert_eq!(sizes, vec![7, 4, 9]);
    }

    #[test]
    fn size_report_unknown_schema() {
        let encoded = sample::registry().unwrap().encode();
        assert!(size_report(&encoded, "cxo.Nope", &[]).is_err());
    }

    #[test]
    fn message_report_describes_messages() {
        let codec = Codec::default();
        let ping = Message::from(PingMsg).encode().unwrap();
        let report = message_report(&ping, &codec).unwrap();
        assert_eq!(report["type"], "PING");
        assert_eq!(report["code"], 1);

        let data = Message::from(DataMsg { data: b"abc".to_vec() }).encode().unwrap();
        let report = message_report(&data, &codec).unwrap();
        assert_eq!(report["details"]["len"], 3);
        assert_eq!(
            report["details"]["reference"],
            ContentHasher::object_ref(b"abc").to_hex()
        );

        let registry = sample::registry().unwrap();
        let reg = Message::from(RegistryMsg { registry: registry.encode() }).encode().unwrap();
        let report = message_report(&reg, &codec).unwrap();
        assert_eq!(report["type"], "REG");
        assert_eq!(report["details"]["reference"], registry.reference().to_hex());
    }

    #[test]
    fn message_report_names_the_failing_type() {
        let mut data = Message::from(DataMsg { data: b"abc".to_vec() }).encode().unwrap();
        data.push(0);
        let err = message_report(&data, &Codec::default()).unwrap_err();
        assert_eq!(err.to_string(), "decoding DATA message");

        let err = message_report(&[42], &Codec::default()).unwrap_err();
        assert_eq!(err.to_string(), "decoding message");
    }

    #[test]
    fn message_report_honours_size_limit() {
        let data = Message::from(DataMsg { data: vec![0; 100] }).encode().unwrap();
        assert!(message_report(&data, &Codec::new(32)).is_err());
    }
}
