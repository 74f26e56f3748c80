//! pdfmend - inspect page trees and encrypt/decrypt PDF strings
//!
//! A command line tool over `pdfmend-core` for uncompressed PDF files.

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use memmap2::Mmap;
use pdfmend_core::SecurityConfig;
use pdfmend_core::catalog::Catalog;
use pdfmend_core::hex::hex_encode;
use pdfmend_core::literal::escape_literal;
use pdfmend_core::security::{PDFSecurityHandler, StandardSecurityHandler};
use pdfmend_core::store::ObjectStore;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pdfmend")]
#[command(about = "Inspect PDF page trees and encrypt/decrypt strings with the standard security handler")]
#[command(version)]
struct Args {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Reject damaged /Encrypt dictionaries instead of deriving a wrong key
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    strict: bool,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-", global = true)]
    outfile: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the page number to object mapping
    Pages {
        file: PathBuf,

        /// Insert an object as a page before listing, as PAGE:OBJID (repeatable)
        #[arg(long = "insert", value_parser = parse_insert, action = ArgAction::Append)]
        inserts: Vec<(usize, u32)>,
    },

    /// Print the file key and whether the password is accepted
    Filekey {
        file: PathBuf,

        /// The user password
        #[arg(short = 'P', long, default_value = "")]
        password: String,

        /// Recover the user password from this owner password
        #[arg(long = "owner-password")]
        owner_password: Option<String>,
    },

    /// Encrypt a string for an object and print it as a literal string
    Encrypt {
        file: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Plain text to encrypt
        text: String,
    },

    /// Decrypt a literal string belonging to an object
    Decrypt {
        file: PathBuf,

        #[command(flatten)]
        target: Target,

        /// Print the plaintext as a hex string instead of a literal string
        #[arg(long, action = ArgAction::SetTrue)]
        hex: bool,

        /// Encrypted literal string, e.g. "(\\223\\)x)"
        literal: String,
    },
}

#[derive(clap::Args, Debug)]
struct Target {
    /// Object number the string belongs to
    #[arg(long = "obj")]
    objid: u32,

    /// Generation number of the object
    #[arg(long = "gen", default_value_t = 0)]
    genno: u32,

    /// The user password
    #[arg(short = 'P', long, default_value = "")]
    password: String,
}

fn parse_insert(s: &str) -> std::result::Result<(usize, u32), String> {
    let (page, objid) = s
        .split_once(':')
        .ok_or_else(|| format!("expected PAGE:OBJID, got {s:?}"))?;
    let page = page
        .trim()
        .parse()
        .map_err(|e| format!("bad page number {page:?}: {e}"))?;
    let objid = objid
        .trim()
        .parse()
        .map_err(|e| format!("bad object id {objid:?}: {e}"))?;
    Ok((page, objid))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn load_store(path: &Path) -> Result<ObjectStore> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("mapping {}", path.display()))?;
    ObjectStore::scan(&mmap).with_context(|| format!("scanning {}", path.display()))
}

fn load_handler(
    store: &ObjectStore,
    password: &str,
    strict: bool,
) -> Result<StandardSecurityHandler> {
    let Some(encrypt) = store.encrypt_dict().context("reading /Encrypt")? else {
        bail!("document is not encrypted");
    };
    let config = SecurityConfig::new().password(password).strict(strict);
    let handler = StandardSecurityHandler::with_config(store.trailer(), &encrypt, &config)?;
    if !handler.verify_user_password() {
        tracing::warn!("user password does not match /U, output will be garbage");
    }
    Ok(handler)
}

fn cmd_pages<W: Write>(out: &mut W, file: &Path, inserts: &[(usize, u32)]) -> Result<()> {
    let store = load_store(file)?;
    let root = store.catalog().context("resolving /Root")?;
    let mut catalog = Catalog::from_root(&store, &root)?;

    for &(page, objid) in inserts {
        catalog
            .insert_page(page, objid)
            .with_context(|| format!("inserting object {objid} as page {page}"))?;
    }

    for (i, objref) in catalog.page_refs().iter().enumerate() {
        writeln!(out, "{}\t{}", i + 1, objref)?;
    }
    Ok(())
}

fn cmd_filekey<W: Write>(
    out: &mut W,
    file: &Path,
    password: &str,
    owner_password: Option<&str>,
    strict: bool,
) -> Result<()> {
    let store = load_store(file)?;
    let mut handler = load_handler(&store, password, strict)?;

    if let Some(owner) = owner_password {
        let Some(user) = handler.recover_user_password(owner.as_bytes()) else {
            bail!("owner password rejected");
        };
        writeln!(out, "user password: {}", String::from_utf8_lossy(&escape_literal(&user)))?;
        let encrypt = store.encrypt_dict()?.unwrap_or_default();
        let config = SecurityConfig::new().password(&user).strict(strict);
        handler = StandardSecurityHandler::with_config(store.trailer(), &encrypt, &config)?;
    }

    writeln!(
        out,
        "filter: /{} V={} R={} length={}",
        handler.filter(),
        handler.version(),
        handler.revision(),
        handler.key_length()
    )?;
    writeln!(out, "permissions: {:#010x}", handler.permissions().bits())?;
    writeln!(
        out,
        "file key: {}",
        String::from_utf8_lossy(&hex_encode(handler.file_key()))
    )?;
    writeln!(out, "user password accepted: {}", handler.verify_user_password())?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("creating {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    match &args.command {
        Command::Pages { file, inserts } => cmd_pages(&mut output, file, inserts)?,
        Command::Filekey {
            file,
            password,
            owner_password,
        } => cmd_filekey(
            &mut output,
            file,
            password,
            owner_password.as_deref(),
            args.strict,
        )?,
        Command::Encrypt { file, target, text } => {
            let store = load_store(file)?;
            let handler = load_handler(&store, &target.password, args.strict)?;
            let literal = handler.encrypt(target.objid, target.genno, text.as_bytes());
            output.write_all(&literal)?;
            writeln!(output)?;
        }
        Command::Decrypt {
            file,
            target,
            hex,
            literal,
        } => {
            let store = load_store(file)?;
            let handler = load_handler(&store, &target.password, args.strict)?;
            let plain = handler.decrypt(target.objid, target.genno, literal.as_bytes());
            let rendered = if *hex {
                hex_encode(&plain)
            } else {
                escape_literal(&plain)
            };
            output.write_all(&rendered)?;
            writeln!(output)?;
        }
    }

    output.flush()?;
    Ok(())
}
