use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use structopt::StructOpt;
use thiserror::Error;
use tracing::{info, warn};

use wsbind_codegen as codegen;
use wsbind_conformance as conformance;
use wsbind_wsdl as wsdl;

mod config;
mod logger;

use codegen::reflect::ServiceContract;
use config::{Config, ConfigError};

#[derive(Debug, Error)]
enum Error {
    #[error("Error reading configuration")]
    Config(#[from] ConfigError),

    #[error("Error parsing WSDL")]
    Parse(#[from] wsdl::error::Error),

    #[error("Error generating bindings")]
    Codegen(#[from] codegen::error::Error),

    #[error("Invalid service contract '{path}'")]
    Contract {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Error serializing violations")]
    Json(#[from] serde_json::Error),

    #[error("Error")]
    Io(#[from] io::Error),
}

#[derive(StructOpt)]
#[structopt(name = "wsbind", about = "Generates bindings from WSDL and WSDL from method contracts")]
struct Args {
    /// Log debug output
    #[structopt(short, long, global = true)]
    verbose: bool,

    /// TOML file with [import] and [reflect] tables
    #[structopt(short, long, global = true, parse(from_os_str))]
    config: Option<PathBuf>,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
struct ImportArgs {
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Protocol to import, instead of the first one that fits each binding
    #[structopt(short, long)]
    protocol: Option<String>,

    /// Also generate completion delegates and events
    #[structopt(long = "async")]
    generate_async: bool,

    #[structopt(long)]
    module: Option<String>,

    input: String,
}

#[derive(StructOpt)]
enum Command {
    /// Generate Rust bindings from a WSDL document
    Import(ImportArgs),

    /// Check a WSDL document against the WS-I Basic Profile
    Check {
        #[structopt(long)]
        json: bool,

        input: String,
    },

    /// Generate WSDL from a TOML service contract
    Reflect {
        #[structopt(short, long, parse(from_os_str))]
        output: Option<PathBuf>,

        /// Protocols to describe; may be repeated
        #[structopt(short, long)]
        protocol: Vec<String>,

        #[structopt(parse(from_os_str))]
        contract: PathBuf,
    },
}

fn write_output(output: Option<&Path>, text: &str) -> Result<(), Error> {
    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            write!(&mut file, "{}", text)?;
            info!(path = %path.display(), "wrote output");
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write!(handle, "{}", text)?;
        }
    }

    Ok(())
}

fn import(config: Config, args: ImportArgs) -> Result<(), Error> {
    let ImportArgs {
        output,
        protocol,
        generate_async,
        module,
        input,
    } = args;

    let mut options = config.import;
    if protocol.is_some() {
        options.protocol = protocol;
    }
    if let Some(module) = module {
        options.module = module;
    }
    options.generate_async |= generate_async;

    let (source, report) = codegen::from_url(&input, &options)?;

    info!(
        classes = report.classes.len(),
        methods = report.methods.len(),
        warnings = %report.warnings,
        "import finished"
    );

    write_output(output.as_deref(), &source)
}

fn check(json: bool, input: &str) -> Result<(), Error> {
    let descriptions = wsdl::parse(input)?;
    let violations = conformance::check(&descriptions);

    if json {
        println!("{}", serde_json::to_string_pretty(&violations)?);
    } else {
        for violation in &violations {
            println!("{}", violation);
        }
    }

    if violations.is_empty() {
        info!("description conforms to the Basic Profile");
    } else {
        warn!(violations = violations.len(), "description does not conform to the Basic Profile");
    }

    Ok(())
}

fn reflect(config: Config, output: Option<PathBuf>, protocols: Vec<String>, path: &Path) -> Result<(), Error> {
    let text = fs::read_to_string(path)?;
    let contract: ServiceContract = toml::from_str(&text).map_err(|source| Error::Contract {
        path: path.to_owned(),
        source,
    })?;

    let mut options = config.reflect;
    if !protocols.is_empty() {
        options.protocols = protocols;
    }

    let (definition, xml) = codegen::to_wsdl(&contract, &options)?;
    info!(
        service = %contract.name,
        bindings = definition.bindings.len(),
        "reflected contract"
    );

    write_output(output.as_deref(), &xml)
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    logger::init(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match args.command {
        Command::Import(args) => import(config, args),
        Command::Check { json, input } => check(json, &input),
        Command::Reflect {
            output,
            protocol,
            contract,
        } => reflect(config, output, protocol, &contract),
    }
}
