//! JAB CLI - Command-line tool for JSON Argument Binding
//!
//! This binary provides command-line interfaces for:
//! - bind: bind a request body to the arguments of a declared method
//! - render: serialize a payload as a declared type under include/exclude rules
//! - ls: list the classes, enums and methods of a schema file

mod config;

use clap::{Parser, Subcommand, ValueEnum};
use config::SchemaFile;
use jab_codec::{Engine, EngineOptions};
use jab_io::{ArgumentDeserializer, JsonSerialization, ResourceMethod};
use jab_model::{Schema, TypeRef, Value};
use serde_json::{json, Value as JsonValue};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "jab")]
#[command(about = "JSON Argument Binding CLI tool")]
#[command(version)]
struct Cli {
    /// Log binding decisions to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind a JSON request body to a method's arguments
    ///
    /// Examples:
    ///   jab bind --schema shop.toml --method OrderController.add --input body.json
    ///   cat body.json | jab bind --schema shop.toml --method OrderController.add
    Bind {
        /// Schema file (TOML)
        #[arg(long)]
        schema: PathBuf,
        /// Target method as Resource.method
        #[arg(long)]
        method: String,
        /// Request body (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Indent the output
        #[arg(long)]
        pretty: bool,
    },
    /// Serialize a JSON document as a declared type
    ///
    /// Examples:
    ///   jab render --schema shop.toml --type Order --input order.json --include customer
    ///   jab render --schema shop.toml --type Order --input order.json --recursive --exclude customer.address
    Render {
        /// Schema file (TOML)
        #[arg(long)]
        schema: PathBuf,
        /// Declared type of the document (e.g. Order, list<Order>)
        #[arg(long = "type")]
        ty: String,
        /// Document to render (stdin when omitted)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Dotted field path to always write (repeatable)
        #[arg(long)]
        include: Vec<String>,
        /// Dotted field path to leave out (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
        /// Write non-primitive fields by default
        #[arg(long)]
        recursive: bool,
        /// Indent the output
        #[arg(long)]
        pretty: bool,
        /// Wrap the output under this root key
        #[arg(long, conflicts_with = "without_root")]
        root: Option<String>,
        /// Never wrap the output, whatever the schema file says
        #[arg(long)]
        without_root: bool,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List classes, enums and methods
    ///
    /// Examples:
    ///   jab ls --schema shop.toml
    ///   jab ls --schema shop.toml --format json
    Ls {
        /// Schema file (TOML)
        #[arg(long)]
        schema: PathBuf,
        /// Output format (table, json)
        #[arg(long, value_enum, default_value_t = LsFormat::Table)]
        format: LsFormat,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LsFormat {
    Table,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Bind {
            schema,
            method,
            input,
            pretty,
        } => {
            handle_bind(&schema, &method, input.as_deref(), pretty)?;
        }
        Commands::Render {
            schema,
            ty,
            input,
            include,
            exclude,
            recursive,
            pretty,
            root,
            without_root,
            output,
        } => {
            let request = RenderRequest {
                ty,
                include,
                exclude,
                recursive,
                pretty,
                root,
                without_root,
            };
            handle_render(&schema, input.as_deref(), output.as_deref(), &request)?;
        }
        Commands::Ls { schema, format } => {
            handle_ls(&schema, format)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut buf = Vec::new();
    match input {
        Some(path) => {
            File::open(path)
                .map_err(|e| format!("cannot open {}: {}", path.display(), e))?
                .read_to_end(&mut buf)?;
        }
        None => {
            io::stdin().lock().read_to_end(&mut buf)?;
        }
    }
    Ok(buf)
}

fn open_output(output: Option<&Path>) -> Result<Box<dyn Write>, Box<dyn Error>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn build_engine(schema: Schema, options: EngineOptions) -> Result<Engine, Box<dyn Error>> {
    Ok(Engine::builder(schema).options(options).build()?)
}

fn handle_bind(
    schema_path: &Path,
    method: &str,
    input: Option<&Path>,
    pretty: bool,
) -> Result<(), Box<dyn Error>> {
    let file = SchemaFile::load(schema_path)?;
    let method = file.method(method)?;
    let engine = Arc::new(build_engine(file.schema()?, file.engine_options())?);
    debug!(method = %method, "binding request body");

    let body = read_input(input)?;
    let deserializer = ArgumentDeserializer::with_declared_names(Arc::clone(&engine));
    let arguments = deserializer.deserialize(body.as_slice(), &method)?;

    let mut rendered = Vec::with_capacity(arguments.len());
    for argument in &arguments {
        rendered.push(match argument {
            Some(value) => engine.value_to_tree(value)?,
            None => JsonValue::Null,
        });
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let tree = JsonValue::Array(rendered);
    if pretty || engine.options().pretty_print {
        serde_json::to_writer_pretty(&mut out, &tree)?;
    } else {
        serde_json::to_writer(&mut out, &tree)?;
    }
    writeln!(out)?;
    Ok(())
}

struct RenderRequest {
    ty: String,
    include: Vec<String>,
    exclude: Vec<String>,
    recursive: bool,
    pretty: bool,
    root: Option<String>,
    without_root: bool,
}

fn handle_render(
    schema_path: &Path,
    input: Option<&Path>,
    output: Option<&Path>,
    request: &RenderRequest,
) -> Result<(), Box<dyn Error>> {
    let file = SchemaFile::load(schema_path)?;
    let ty: TypeRef = request.ty.parse()?;

    let mut options = file.engine_options();
    options.pretty_print |= request.pretty;
    if request.root.is_some() {
        options.root_wrapping = true;
    }
    if request.without_root {
        options.root_wrapping = false;
    }
    let engine = build_engine(file.schema()?, options)?;

    let body = read_input(input)?;
    let document: JsonValue = serde_json::from_slice(&body)?;
    let value = engine.from_tree(&document, &ty, "$")?;

    let serialization = JsonSerialization::new(&engine);
    let mut serializer = match &request.root {
        Some(alias) => serialization.from_with_alias(value, alias.clone()),
        None => serialization.from(value),
    };
    for path in &request.include {
        serializer = serializer.include(path)?;
    }
    for path in &request.exclude {
        serializer = serializer.exclude(path)?;
    }
    if request.recursive {
        serializer = serializer.recursive();
    }

    let mut out = open_output(output)?;
    serializer.serialize(&mut out)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

fn handle_ls(schema_path: &Path, format: LsFormat) -> Result<(), Box<dyn Error>> {
    let file = SchemaFile::load(schema_path)?;
    let schema = file.schema()?;
    let methods = file.methods()?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        LsFormat::Table => print_table(&mut out, &schema, &methods)?,
        LsFormat::Json => {
            let listing = listing_json(&schema, &methods);
            serde_json::to_writer_pretty(&mut out, &listing)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn user_classes(schema: &Schema) -> impl Iterator<Item = &jab_model::ClassDef> + '_ {
    schema
        .classes()
        .filter(|class| class.name.as_str() != jab_model::LAZY_PROXY)
}

fn print_table(
    out: &mut impl Write,
    schema: &Schema,
    methods: &[ResourceMethod],
) -> Result<(), Box<dyn Error>> {
    writeln!(out, "Classes:")?;
    for class in user_classes(schema) {
        match &class.parent {
            Some(parent) => writeln!(out, "  {} extends {}", class.name, parent)?,
            None => writeln!(out, "  {}", class.name)?,
        }
        for field in &class.fields {
            let marker = if schema.is_primitive(&field.ty) { "" } else { " *" };
            writeln!(out, "    {:<20} {}{}", field.name, field.ty, marker)?;
        }
    }

    let enums: Vec<_> = schema.enums().collect();
    if !enums.is_empty() {
        writeln!(out, "Enums:")?;
        for def in enums {
            writeln!(out, "  {} = {}", def.name, def.variants.join(" | "))?;
        }
    }

    if !methods.is_empty() {
        writeln!(out, "Methods:")?;
        for method in methods {
            writeln!(out, "  {}", method)?;
        }
    }
    Ok(())
}

fn listing_json(schema: &Schema, methods: &[ResourceMethod]) -> JsonValue {
    let classes: Vec<_> = user_classes(schema)
        .map(|class| {
            json!({
                "name": class.name.as_str(),
                "extends": class.parent.as_ref().map(|p| p.as_str()),
                "fields": class.fields.iter().map(|field| json!({
                    "name": field.name,
                    "type": field.ty.to_string(),
                    "primitive": schema.is_primitive(&field.ty),
                })).collect::<Vec<_>>(),
            })
        })
        .collect();
    let enums: Vec<_> = schema
        .enums()
        .map(|def| json!({"name": def.name.as_str(), "variants": def.variants}))
        .collect();
    let methods: Vec<_> = methods
        .iter()
        .map(|method| {
            json!({
                "method": method.qualified_name(),
                "params": method.params().iter().map(|p| json!({
                    "name": p.name,
                    "type": p.ty.to_string(),
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({"classes": classes, "enums": enums, "methods": methods})
}
