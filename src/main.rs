use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};

use invoice_studio::config::{config_dir, init_config, load_config, resolve_output_dir, Config};
use invoice_studio::error::{InvoiceError, Result};
use invoice_studio::magic_fill::{magic_fill, Extractor, HttpExtractor, JsonFileExtractor};
use invoice_studio::model::{InvoiceRecord, InvoiceStatus, LineItem, PartyInfo};
use invoice_studio::money::{
    compute_totals, format_currency, format_long_date, format_percent, format_quantity,
};
use invoice_studio::pdf::{logo_data_uri, pdf_filename, write_pdf, FontSet};
use invoice_studio::render::RenderJob;
use invoice_studio::store::{InvoiceStore, JsonFileStore};

#[derive(Parser)]
#[command(name = "invoice")]
#[command(version, about = "Invoice editor with Magic Fill and PDF export", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.invoice-studio or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Create a new invoice from the configured defaults
    New {
        /// Client name
        #[arg(long)]
        recipient: Option<String>,

        /// Client email
        #[arg(long)]
        recipient_email: Option<String>,

        /// Line items in format "description:quantity:rate" (can be repeated)
        #[arg(short, long, value_name = "DESC:QTY:RATE")]
        item: Vec<String>,

        /// Tax rate in percent (overrides config)
        #[arg(long)]
        tax: Option<f64>,

        /// Notes printed at the bottom of the invoice
        #[arg(long)]
        notes: Option<String>,

        /// PNG or JPEG logo
        #[arg(long, value_name = "FILE")]
        logo: Option<PathBuf>,

        /// Save as final instead of draft
        #[arg(long = "final")]
        finalized: bool,
    },

    /// List saved invoices, newest first
    List {
        /// Number of invoices to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one invoice
    Show {
        /// Index from 'list', record id or invoice number
        invoice: String,
    },

    /// Fill invoice fields from free text (Magic Fill)
    #[command(group(ArgGroup::new("source").required(true).args(["text", "json"])))]
    Fill {
        /// Index from 'list', record id or invoice number
        invoice: String,

        /// Text describing the invoice, sent to the Magic Fill endpoint
        #[arg(long)]
        text: Option<String>,

        /// A saved Magic Fill reply to apply instead of calling the endpoint
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },

    /// Append a line item
    AddItem {
        /// Index from 'list', record id or invoice number
        invoice: String,

        /// Item in format "description:quantity:rate"
        #[arg(value_name = "DESC:QTY:RATE")]
        item: String,
    },

    /// Remove a line item by its 1-based position
    RemoveItem {
        /// Index from 'list', record id or invoice number
        invoice: String,

        /// Item position as shown by 'show'
        position: usize,
    },

    /// Export an invoice as PDF
    Render {
        /// Index from 'list', record id or invoice number
        invoice: String,

        /// Custom output file path (default: output_dir/invoice-<number>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open generated PDF with system default viewer
        #[arg(long)]
        open: bool,
    },

    /// Export every saved invoice as PDF
    RenderAll {
        /// Only invoices with this status
        #[arg(long)]
        status: Option<StatusFilter>,
    },

    /// Copy an invoice into a new draft
    Duplicate {
        /// Index from 'list', record id or invoice number
        invoice: String,
    },

    /// Mark an invoice as final
    Finalize {
        /// Index from 'list', record id or invoice number
        invoice: String,
    },

    /// Move a final invoice back to draft
    Reopen {
        /// Index from 'list', record id or invoice number
        invoice: String,
    },

    /// Delete an invoice
    Delete {
        /// Index from 'list', record id or invoice number
        invoice: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusFilter {
    Draft,
    Final,
}

impl From<StatusFilter> for InvoiceStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Draft => InvoiceStatus::Draft,
            StatusFilter::Final => InvoiceStatus::Final,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::New {
            recipient,
            recipient_email,
            item,
            tax,
            notes,
            logo,
            finalized,
        } => cmd_new(
            &cfg_dir,
            NewInvoice {
                recipient,
                recipient_email,
                items: item,
                tax,
                notes,
                logo,
                finalized,
            },
        ),
        Commands::List { limit } => cmd_list(&cfg_dir, limit),
        Commands::Show { invoice } => cmd_show(&cfg_dir, &invoice),
        Commands::Fill {
            invoice,
            text,
            json,
        } => cmd_fill(&cfg_dir, &invoice, text, json),
        Commands::AddItem { invoice, item } => cmd_add_item(&cfg_dir, &invoice, &item),
        Commands::RemoveItem { invoice, position } => {
            cmd_remove_item(&cfg_dir, &invoice, position)
        }
        Commands::Render {
            invoice,
            output,
            open,
        } => cmd_render(&cfg_dir, &invoice, output, open),
        Commands::RenderAll { status } => cmd_render_all(&cfg_dir, status.map(Into::into)),
        Commands::Duplicate { invoice } => cmd_duplicate(&cfg_dir, &invoice),
        Commands::Finalize { invoice } => {
            cmd_set_status(&cfg_dir, &invoice, InvoiceStatus::Final)
        }
        Commands::Reopen { invoice } => cmd_set_status(&cfg_dir, &invoice, InvoiceStatus::Draft),
        Commands::Delete { invoice } => cmd_delete(&cfg_dir, &invoice),
    }
}

/// Loaded config plus the history store for one command.
struct Session {
    cfg_dir: PathBuf,
    config: Config,
    store: JsonFileStore,
}

impl Session {
    fn open(cfg_dir: &Path) -> Result<Self> {
        if !cfg_dir.exists() {
            return Err(InvoiceError::ConfigNotFound(cfg_dir.to_path_buf()));
        }
        let config = load_config(cfg_dir)?;
        let store = JsonFileStore::open(cfg_dir)?;
        Ok(Self {
            cfg_dir: cfg_dir.to_path_buf(),
            config,
            store,
        })
    }

    fn user(&self) -> &str {
        &self.config.user_id
    }

    /// Resolve an invoice reference to a saved record.
    /// Accepts an index (1-based) from 'list', a record id or an invoice number.
    fn resolve(&self, reference: &str) -> Result<InvoiceRecord> {
        let records = self.store.list(self.user())?;

        // Try to parse as an index first
        if let Ok(idx) = reference.parse::<usize>() {
            if idx == 0 || idx > records.len() {
                return Err(InvoiceError::InvalidInvoiceIndex(reference.to_string()));
            }
            return Ok(records[idx - 1].clone());
        }

        records
            .into_iter()
            .find(|r| r.id == reference || r.data.invoice_number == reference)
            .ok_or_else(|| InvoiceError::InvoiceNotFound(reference.to_string()))
    }

    fn save(&mut self, record: &InvoiceRecord) -> Result<InvoiceRecord> {
        let user = self.config.user_id.clone();
        self.store.update(&user, record)
    }

    fn fonts(&self) -> Result<FontSet> {
        let (regular, bold) = self.config.pdf.font_sources(&self.cfg_dir);
        FontSet::load(&regular, &bold, self.config.pdf.render_timeout())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    init_config(cfg_dir)?;

    println!("Initialized invoice config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your business details:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Optionally set [magic_fill] endpoint to fill invoices from text");
    println!();
    println!("Then create your first invoice:");
    println!("  invoice new --recipient \"Client Name\" --item \"Design work:8:95\"");

    Ok(())
}

struct NewInvoice {
    recipient: Option<String>,
    recipient_email: Option<String>,
    items: Vec<String>,
    tax: Option<f64>,
    notes: Option<String>,
    logo: Option<PathBuf>,
    finalized: bool,
}

/// Create a new invoice
fn cmd_new(cfg_dir: &Path, args: NewInvoice) -> Result<()> {
    let mut session = Session::open(cfg_dir)?;
    let mut data = session.config.new_invoice(today())?;

    // Validate every input before anything is saved
    if !args.items.is_empty() {
        data.items = args
            .items
            .iter()
            .map(|spec| LineItem::from_spec(spec))
            .collect::<Result<Vec<_>>>()?;
    }
    if args.tax.is_some() {
        data.set_tax(args.tax)?;
    }
    if let Some(logo) = &args.logo {
        data.logo = Some(logo_data_uri(&std::fs::read(logo)?)?);
    }
    data.recipient = PartyInfo {
        name: args.recipient.unwrap_or_default(),
        email: args.recipient_email.unwrap_or_default(),
        ..PartyInfo::default()
    };
    if let Some(notes) = args.notes {
        data.notes = Some(notes);
    }

    let status = if args.finalized {
        InvoiceStatus::Final
    } else {
        InvoiceStatus::Draft
    };
    let user = session.config.user_id.clone();
    let record = session.store.create(&user, status, data)?;
    let totals = compute_totals(&record.data);

    println!("Created {} ({})", record.data.invoice_number, record.status);
    println!("  Id:     {}", record.id);
    println!(
        "  Client: {}",
        record.data.recipient.display_name("Client Name")
    );
    println!("  Total:  {}", format_currency(totals.total));

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "CLIENT")]
    client: String,
    #[tabled(rename = "ITEMS")]
    items: usize,
    #[tabled(rename = "TOTAL")]
    total: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "UPDATED")]
    updated: String,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "QTY")]
    quantity: String,
    #[tabled(rename = "RATE")]
    rate: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
}

/// List saved invoices, newest first
fn cmd_list(cfg_dir: &Path, limit: Option<usize>) -> Result<()> {
    let session = Session::open(cfg_dir)?;
    let records = session.store.list(session.user())?;

    if records.is_empty() {
        println!("No invoices saved yet.");
        return Ok(());
    }

    let shown = limit.unwrap_or(records.len()).min(records.len());
    let rows: Vec<InvoiceRow> = records
        .iter()
        .take(shown)
        .enumerate()
        .map(|(idx, record)| InvoiceRow {
            index: idx + 1,
            number: record.data.invoice_number.clone(),
            client: record.data.recipient.display_name("-").to_string(),
            items: record.data.items.len(),
            total: format_currency(compute_totals(&record.data).total),
            status: record.status.to_string(),
            updated: record
                .updated_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    println!();
    println!("Total: {} invoices", records.len());
    println!("Use index number with show/fill/render/duplicate (e.g., 'invoice show 1')");

    Ok(())
}

/// Show one invoice
fn cmd_show(cfg_dir: &Path, invoice_ref: &str) -> Result<()> {
    let session = Session::open(cfg_dir)?;
    let record = session.resolve(invoice_ref)?;
    let data = &record.data;

    println!("{} ({})", data.invoice_number, record.status);
    println!("  Id:      {}", record.id);
    println!("  From:    {}", party_line(&data.sender, "Your Business"));
    println!("  Bill to: {}", party_line(&data.recipient, "Client Name"));
    println!("  Issued:  {}", format_long_date(data.issue_date));
    println!("  Due:     {}", format_long_date(data.due_date));
    println!();

    let rows: Vec<ItemRow> = data
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| ItemRow {
            index: idx + 1,
            description: item.description.clone(),
            quantity: format_quantity(item.quantity()),
            rate: format_currency(item.rate().unwrap_or(0.0)),
            amount: format_currency(item.amount()),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    let totals = compute_totals(data);
    println!();
    println!("  Subtotal:  {}", format_currency(totals.subtotal));
    if let Some(rate) = data.tax.filter(|rate| *rate > 0.0) {
        println!(
            "  Tax ({}%): {}",
            format_percent(rate),
            format_currency(totals.tax_amount)
        );
    }
    println!("  Total:     {}", format_currency(totals.total));

    if let Some(notes) = data.notes_text() {
        println!();
        println!("Notes:");
        for line in notes.lines() {
            println!("  {line}");
        }
    }

    Ok(())
}

fn party_line(party: &PartyInfo, placeholder: &str) -> String {
    let mut parts = vec![party.display_name(placeholder).to_string()];
    parts.extend(party.email().map(|e| format!("<{e}>")));
    parts.extend(party.address().map(|a| a.replace('\n', ", ")));
    parts.extend(party.phone().map(str::to_string));
    parts.join("  ")
}

/// Fill invoice fields from text via Magic Fill
fn cmd_fill(
    cfg_dir: &Path,
    invoice_ref: &str,
    text: Option<String>,
    json: Option<PathBuf>,
) -> Result<()> {
    let mut session = Session::open(cfg_dir)?;
    let mut record = session.resolve(invoice_ref)?;

    let (extractor, text): (Box<dyn Extractor>, String) = match (json, text) {
        (Some(path), _) => (Box::new(JsonFileExtractor::new(path)), String::new()),
        (None, Some(text)) => {
            let endpoint = session
                .config
                .magic_fill
                .endpoint
                .clone()
                .filter(|e| !e.trim().is_empty())
                .ok_or(InvoiceError::MagicFillNotConfigured)?;
            let timeout = session.config.magic_fill.timeout();
            (Box::new(HttpExtractor::new(endpoint, timeout)), text)
        }
        (None, None) => return Err(InvoiceError::EmptyFillText),
    };

    record.data = magic_fill(extractor.as_ref(), &record.data, &text)?;
    let saved = session.save(&record)?;
    let totals = compute_totals(&saved.data);

    println!("Filled {}", saved.data.invoice_number);
    println!(
        "  Client: {}",
        saved.data.recipient.display_name("Client Name")
    );
    println!("  Items:  {}", saved.data.items.len());
    println!("  Total:  {}", format_currency(totals.total));

    Ok(())
}

/// Append a line item
fn cmd_add_item(cfg_dir: &Path, invoice_ref: &str, spec: &str) -> Result<()> {
    let mut session = Session::open(cfg_dir)?;
    let mut record = session.resolve(invoice_ref)?;

    let item = LineItem::from_spec(spec)?;
    let description = item.description.clone();
    record.data.add_item(item);
    let saved = session.save(&record)?;

    println!("Added '{}' to {}", description, saved.data.invoice_number);
    println!(
        "  Total: {}",
        format_currency(compute_totals(&saved.data).total)
    );
    Ok(())
}

/// Remove a line item by position
fn cmd_remove_item(cfg_dir: &Path, invoice_ref: &str, position: usize) -> Result<()> {
    let mut session = Session::open(cfg_dir)?;
    let mut record = session.resolve(invoice_ref)?;

    if position == 0 {
        return Err(InvoiceError::InvalidItemIndex {
            index: 0,
            count: record.data.items.len(),
        });
    }
    let removed = record.data.remove_item(position - 1)?;
    let saved = session.save(&record)?;

    println!(
        "Removed item {} ('{}') from {}",
        position, removed.description, saved.data.invoice_number
    );
    println!(
        "  Total: {}",
        format_currency(compute_totals(&saved.data).total)
    );
    Ok(())
}

/// Export one invoice as PDF
fn cmd_render(cfg_dir: &Path, invoice_ref: &str, output: Option<PathBuf>, open: bool) -> Result<()> {
    let session = Session::open(cfg_dir)?;
    let record = session.resolve(invoice_ref)?;
    let fonts = Arc::new(session.fonts()?);

    let pdf_path = output.unwrap_or_else(|| {
        resolve_output_dir(&session.cfg_dir, &session.config).join(pdf_filename(&record.data))
    });
    let bytes = RenderJob::spawn(record.data.clone(), fonts)
        .wait(session.config.pdf.render_timeout())?;
    write_pdf(&bytes, &pdf_path)?;

    println!("Rendered {}", record.data.invoice_number);
    println!("  Saved: {}", pdf_path.display());

    if open {
        open_path(&pdf_path)?;
    }
    Ok(())
}

/// Export every invoice, reporting failures per invoice
fn cmd_render_all(cfg_dir: &Path, status: Option<InvoiceStatus>) -> Result<()> {
    let session = Session::open(cfg_dir)?;
    let records: Vec<InvoiceRecord> = session
        .store
        .list(session.user())?
        .into_iter()
        .filter(|r| status.map_or(true, |s| r.status == s))
        .collect();

    if records.is_empty() {
        println!("No invoices to render.");
        return Ok(());
    }

    let fonts = Arc::new(session.fonts()?);
    let output_dir = resolve_output_dir(&session.cfg_dir, &session.config);
    let timeout = session.config.pdf.render_timeout();

    let mut failed = 0;
    for record in &records {
        let path = output_dir.join(pdf_filename(&record.data));
        let job = RenderJob::spawn(record.data.clone(), Arc::clone(&fonts));
        let label = job.label().to_string();
        let result = job.wait(timeout).and_then(|bytes| write_pdf(&bytes, &path));
        match result {
            Ok(()) => println!("  ok      {label} -> {}", path.display()),
            Err(e) => {
                failed += 1;
                println!("  failed  {label}: {e}");
            }
        }
    }

    println!();
    println!("Rendered {} of {} invoices", records.len() - failed, records.len());
    if failed > 0 {
        return Err(InvoiceError::PdfGeneration(format!(
            "{failed} invoice(s) failed to render"
        )));
    }
    Ok(())
}

/// Copy an invoice into a new draft
fn cmd_duplicate(cfg_dir: &Path, invoice_ref: &str) -> Result<()> {
    let mut session = Session::open(cfg_dir)?;
    let source = session.resolve(invoice_ref)?;

    let user = session.config.user_id.clone();
    let copy = session
        .store
        .create(&user, InvoiceStatus::Draft, source.data.duplicate(today()))?;

    println!(
        "Duplicated {} as {}",
        source.data.invoice_number, copy.data.invoice_number
    );
    println!("  Id: {}", copy.id);
    Ok(())
}

/// Change the status of an invoice
fn cmd_set_status(cfg_dir: &Path, invoice_ref: &str, status: InvoiceStatus) -> Result<()> {
    let mut session = Session::open(cfg_dir)?;
    let mut record = session.resolve(invoice_ref)?;

    if record.status == status {
        println!("{} is already {}", record.data.invoice_number, status);
        return Ok(());
    }
    record.status = status;
    let saved = session.save(&record)?;

    println!("Marked {} as {}", saved.data.invoice_number, saved.status);
    Ok(())
}

/// Delete an invoice
fn cmd_delete(cfg_dir: &Path, invoice_ref: &str) -> Result<()> {
    let mut session = Session::open(cfg_dir)?;
    let record = session.resolve(invoice_ref)?;

    let user = session.config.user_id.clone();
    session.store.delete(&user, &record.id)?;

    println!("Deleted {}", record.data.invoice_number);
    Ok(())
}

fn open_path(pdf_path: &Path) -> Result<()> {
    // Open with system default viewer
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(pdf_path).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", pdf_path.to_str().unwrap_or("")])
            .spawn()?;
    }
    Ok(())
}
