use chrono::Local;
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use billsync::config::{
    config_dir, load_config, load_customers, load_products, load_state, resolve_output_dir,
    Customer, State, CONFIG_TEMPLATE, CUSTOMERS_TEMPLATE, PRODUCTS_TEMPLATE,
};
use billsync::error::{BillingError, Result};
use billsync::inventory::stock_report;
use billsync::invoice::{
    active_numbers, create_invoice, delete_invoice, edit_invoice, invoice_stats, restore_invoice,
    sales_report, set_status, Invoice, InvoiceStatus, Month,
};
use billsync::numbering::{format_invoice_number, PoolStore};
use billsync::profit::{
    compute_profit_summary, filter_clients, sort_clients, CostBasis, SortDirection, SortKey,
};
use billsync::replies::{add_reply, replies_for};

#[derive(Parser)]
#[command(name = "billsync")]
#[command(version, about = "Small-business billing from the command line", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.billsync or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with template files
    Init,

    /// List configured customers
    Customers,

    /// List products with sale and purchase prices
    Products,

    /// Show book status and the next invoice number
    Status,

    /// List products that are low on or out of stock
    Stock,

    /// Record a reply in a customer's log
    Reply {
        /// Customer identifier from customers.toml
        customer: String,

        /// Reply text
        message: String,

        /// Who wrote the reply (default: admin)
        #[arg(long)]
        author: Option<String>,
    },

    /// Show a customer's replies, newest first
    Replies {
        /// Customer identifier from customers.toml
        customer: String,
    },

    /// Create a new invoice
    Create {
        /// Customer identifier from customers.toml
        #[arg(short, long)]
        customer: String,

        /// Line items in format "product:quantity" (can be repeated)
        #[arg(short, long, value_name = "PRODUCT:QTY")]
        item: Vec<String>,

        /// Initial status (pending, paid, overdue, cancelled)
        #[arg(long, default_value = "pending")]
        status: String,

        /// Free-form notes printed with the invoice
        #[arg(long)]
        notes: Option<String>,
    },

    /// List invoices, newest first
    List {
        /// Number of invoices to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only show invoices with this status
        #[arg(long)]
        status: Option<String>,
    },

    /// Show an invoice with its line items
    Show {
        /// Invoice number or index from 'list' (e.g., 1 or INV-0000000001)
        invoice: String,
    },

    /// Replace an invoice's line items
    Edit {
        /// Invoice number or index from 'list' (e.g., 1 or INV-0000000001)
        invoice: String,

        /// New line items in format "product:quantity" (replaces existing items)
        #[arg(short, long, value_name = "PRODUCT:QTY")]
        item: Vec<String>,
    },

    /// Change an invoice's status
    SetStatus {
        /// Invoice number or index from 'list' (e.g., 1 or INV-0000000001)
        invoice: String,

        /// New status (pending, paid, overdue, cancelled)
        status: String,
    },

    /// Mark an invoice as paid
    MarkPaid {
        /// Invoice number or index from 'list' (e.g., 1 or INV-0000000001)
        invoice: String,
    },

    /// Delete an invoice; its number returns to the pool for reuse
    Delete {
        /// Invoice number or index from 'list' (e.g., 1 or INV-0000000001)
        invoice: String,
    },

    /// List deleted invoices that can be restored
    Deleted,

    /// Restore a deleted invoice under its original number
    Restore {
        /// Invoice number or index from 'deleted'
        invoice: String,
    },

    /// Show invoice numbers waiting for reuse
    Pool,

    /// Profit and margin per customer
    Profit {
        /// Sort by: name, revenue, invoices, profit, margin
        #[arg(long, default_value = "profit")]
        sort: String,

        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,

        /// Only show customers whose name contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// Monthly sales report
    Sales {
        /// Month to report on (YYYY-MM, default: current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Customer identifier to narrow the report to
        #[arg(short, long)]
        customer: Option<String>,

        /// Also write the report as CSV into the export directory
        #[arg(long)]
        csv: bool,
    },

    /// Invoice count and summed totals
    Stats,
}

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    if !matches!(cli.command, Commands::Init) && !cfg_dir.exists() {
        return Err(BillingError::ConfigNotFound(cfg_dir));
    }

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Customers => cmd_customers(&cfg_dir),
        Commands::Products => cmd_products(&cfg_dir),
        Commands::Status => cmd_status(&cfg_dir),
        Commands::Stock => cmd_stock(&cfg_dir),
        Commands::Reply {
            customer,
            message,
            author,
        } => cmd_reply(&cfg_dir, &customer, &message, author.as_deref()),
        Commands::Replies { customer } => cmd_replies(&cfg_dir, &customer),
        Commands::Create {
            customer,
            item,
            status,
            notes,
        } => cmd_create(&cfg_dir, &customer, &item, &status, notes),
        Commands::List { limit, status } => cmd_list(&cfg_dir, limit, status),
        Commands::Show { invoice } => cmd_show(&cfg_dir, &invoice),
        Commands::Edit { invoice, item } => cmd_edit(&cfg_dir, &invoice, &item),
        Commands::SetStatus { invoice, status } => cmd_set_status(&cfg_dir, &invoice, &status),
        Commands::MarkPaid { invoice } => cmd_set_status(&cfg_dir, &invoice, "paid"),
        Commands::Delete { invoice } => cmd_delete(&cfg_dir, &invoice),
        Commands::Deleted => cmd_deleted(&cfg_dir),
        Commands::Restore { invoice } => cmd_restore(&cfg_dir, &invoice),
        Commands::Pool => cmd_pool(&cfg_dir),
        Commands::Profit { sort, asc, search } => cmd_profit(&cfg_dir, &sort, asc, search),
        Commands::Sales {
            month,
            customer,
            csv,
        } => cmd_sales(&cfg_dir, month, customer, csv),
        Commands::Stats => cmd_stats(&cfg_dir),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(BillingError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("exports"))?;

    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;
    fs::write(cfg_dir.join("customers.toml"), CUSTOMERS_TEMPLATE)?;
    fs::write(cfg_dir.join("products.toml"), PRODUCTS_TEMPLATE)?;

    println!("Initialized billsync config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Edit your company details:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!(
        "  2. Add your customers:         $EDITOR {}/customers.toml",
        cfg_dir.display()
    );
    println!(
        "  3. Add your products:          $EDITOR {}/products.toml",
        cfg_dir.display()
    );
    println!();
    println!("Then create your first invoice:");
    println!("  billsync create --customer <customer-id> --item <product>:<quantity>");

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct CustomerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "EMAIL")]
    email: String,
    #[tabled(rename = "PHONE")]
    phone: String,
}

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "SKU")]
    sku: String,
    #[tabled(rename = "PRICE")]
    price: String,
    #[tabled(rename = "COST")]
    cost: String,
    #[tabled(rename = "UNIT")]
    unit: String,
    #[tabled(rename = "STOCK")]
    stock: String,
}

#[derive(Tabled)]
struct StockRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "CATEGORY")]
    category: String,
    #[tabled(rename = "STOCK")]
    stock: String,
    #[tabled(rename = "MIN")]
    min: String,
}

#[derive(Tabled)]
struct ReplyRow {
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "AUTHOR")]
    author: String,
    #[tabled(rename = "MESSAGE")]
    message: String,
}

#[derive(Tabled)]
struct InvoiceRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "TOTAL")]
    total: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "CUSTOMER")]
    customer: String,
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "PRODUCT")]
    product: String,
    #[tabled(rename = "QTY")]
    quantity: String,
    #[tabled(rename = "PRICE")]
    price: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
}

#[derive(Tabled)]
struct DeletedRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "CUSTOMER")]
    customer: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "TOTAL")]
    total: String,
    #[tabled(rename = "DELETED AT")]
    deleted_at: String,
}

#[derive(Tabled)]
struct ProfitRow {
    #[tabled(rename = "CUSTOMER")]
    customer: String,
    #[tabled(rename = "INVOICES")]
    invoices: usize,
    #[tabled(rename = "REVENUE")]
    revenue: String,
    #[tabled(rename = "PROFIT")]
    profit: String,
    #[tabled(rename = "MARGIN")]
    margin: String,
}

#[derive(Tabled)]
struct SalesRow {
    #[tabled(rename = "NUMBER")]
    number: String,
    #[tabled(rename = "CUSTOMER")]
    customer: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "DUE")]
    due: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
}

fn format_grouped_int(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut grouped: String = out.chars().rev().collect();
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// Format a money amount with two decimal places and thousands separators
fn format_money(value: f64, currency_symbol: &str) -> String {
    let cents = (value * 100.0).round() as i64;
    let whole = format_grouped_int((cents / 100).abs());
    let sign = if cents < 0 { "-" } else { "" };
    format!("{sign}{currency_symbol}{whole}.{:02}", (cents % 100).abs())
}

/// Append summary rows under the TOTAL column of the invoice table
fn add_summary_footer(table: &str, rows: &[(&str, String)]) -> String {
    let lines: Vec<&str> = table.lines().collect();
    if lines.len() < 4 || rows.is_empty() {
        return table.to_string();
    }

    // Parse the top border to discover column widths
    let Some(inner) = lines[0].strip_prefix('╭').and_then(|s| s.strip_suffix('╮')) else {
        return table.to_string();
    };

    let widths: Vec<usize> = inner.split('┬').map(|p| p.chars().count()).collect();
    if widths.len() < 6 {
        return table.to_string();
    }

    // #, NUMBER and DATE merge into the label cell; STATUS and CUSTOMER are closed off
    let left_width = widths[0] + widths[1] + widths[2] + 2;
    let total_width = widths[3];

    let mut out = lines[..lines.len() - 1].join("\n");
    out.push('\n');
    out.push_str(&format!(
        "├{}┴{}┴{}┼{}┼{}┴{}╯\n",
        "─".repeat(widths[0]),
        "─".repeat(widths[1]),
        "─".repeat(widths[2]),
        "─".repeat(total_width),
        "─".repeat(widths[4]),
        "─".repeat(widths[5]),
    ));

    for (idx, (label, value)) in rows.iter().enumerate() {
        out.push_str(&format!(
            "│ {:>left$} │ {:>total$} │\n",
            label,
            value,
            left = left_width - 2,
            total = total_width - 2
        ));
        if idx < rows.len() - 1 {
            out.push_str(&format!(
                "├{}┼{}┤\n",
                "─".repeat(left_width),
                "─".repeat(total_width)
            ));
        }
    }

    out.push_str(&format!(
        "╰{}┴{}╯",
        "─".repeat(left_width),
        "─".repeat(total_width)
    ));

    out
}

fn customer_label(customers: &BTreeMap<String, Customer>, customer_id: Option<&str>) -> String {
    match customer_id {
        Some(id) => customers
            .get(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("Customer #{id}")),
        None => "Unknown".to_string(),
    }
}

/// Resolve an invoice reference to the actual invoice number.
/// Accepts the full invoice number or a 1-based index from 'list'.
fn resolve_invoice_number(state: &State, reference: &str) -> Result<String> {
    if state.find(reference).is_some() {
        return Ok(reference.to_string());
    }

    let Ok(idx) = reference.parse::<usize>() else {
        return Err(BillingError::InvoiceNotFound(reference.to_string()));
    };

    // Invoices are displayed in reverse order (newest first), 1-indexed
    if idx == 0 || idx > state.invoices.len() {
        return Err(BillingError::InvalidInvoiceIndex(reference.to_string()));
    }
    Ok(state.invoices[state.invoices.len() - idx].number.clone())
}

/// Same as `resolve_invoice_number`, against the deleted archive
fn resolve_archived_number(state: &State, reference: &str) -> Result<String> {
    if state.deleted.iter().any(|a| a.invoice.number == reference) {
        return Ok(reference.to_string());
    }

    match reference.parse::<usize>() {
        Ok(idx) if idx >= 1 && idx <= state.deleted.len() => {
            Ok(state.deleted[state.deleted.len() - idx].invoice.number.clone())
        }
        _ => Err(BillingError::ArchivedInvoiceNotFound(reference.to_string())),
    }
}

/// List configured customers
fn cmd_customers(cfg_dir: &Path) -> Result<()> {
    let customers = load_customers(cfg_dir)?;

    if customers.is_empty() {
        println!("No customers configured.");
        println!("Add customers to: {}/customers.toml", cfg_dir.display());
        return Ok(());
    }

    let rows: Vec<CustomerRow> = customers
        .iter()
        .map(|(id, customer)| CustomerRow {
            id: id.clone(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone().unwrap_or_default(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// List products
fn cmd_products(cfg_dir: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let products = load_products(cfg_dir)?;

    if products.is_empty() {
        println!("No products configured.");
        println!("Add products to: {}/products.toml", cfg_dir.display());
        return Ok(());
    }

    let symbol = &config.invoice.currency_symbol;
    let rows: Vec<ProductRow> = products
        .iter()
        .map(|(id, product)| ProductRow {
            id: id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone().unwrap_or_default(),
            price: format_money(product.price, symbol),
            cost: match product.cost_basis() {
                CostBasis::Known(cost) => format_money(cost, symbol),
                CostBasis::Unknown => "-".to_string(),
            },
            unit: format!("/{}", product.unit),
            stock: product
                .stock_quantity
                .map(|q| q.to_string())
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// List low and out-of-stock products
fn cmd_stock(cfg_dir: &Path) -> Result<()> {
    let products = load_products(cfg_dir)?;
    let report = stock_report(&products);

    if !report.needs_attention() {
        println!("All stock-tracked products are above their minimum level.");
        return Ok(());
    }

    let to_rows = |rows: &[billsync::inventory::StockRow]| -> Vec<StockRow> {
        rows.iter()
            .map(|row| StockRow {
                id: row.product_id.clone(),
                name: row.name.clone(),
                category: row.category.clone().unwrap_or_default(),
                stock: row.stock_quantity.to_string(),
                min: row.min_stock_level.to_string(),
            })
            .collect()
    };

    if !report.low.is_empty() {
        println!("Low stock ({}):", report.low.len());
        let table = Table::new(to_rows(&report.low)).with(Style::rounded()).to_string();
        println!("{table}");
    }
    if !report.out.is_empty() {
        println!("Out of stock ({}):", report.out.len());
        let table = Table::new(to_rows(&report.out)).with(Style::rounded()).to_string();
        println!("{table}");
    }

    Ok(())
}

fn cmd_reply(cfg_dir: &Path, customer_id: &str, message: &str, author: Option<&str>) -> Result<()> {
    let reply = add_reply(cfg_dir, customer_id, message, author)?;
    println!("Recorded reply from {} for {}", reply.author, customer_id);
    Ok(())
}

fn cmd_replies(cfg_dir: &Path, customer_id: &str) -> Result<()> {
    let customers = load_customers(cfg_dir)?;
    if !customers.contains_key(customer_id) {
        return Err(BillingError::CustomerNotFound(customer_id.to_string()));
    }

    let state = load_state(cfg_dir)?;
    let replies = replies_for(&state, customer_id);
    if replies.is_empty() {
        println!("No replies for {customer_id}.");
        return Ok(());
    }

    let rows: Vec<ReplyRow> = replies
        .iter()
        .map(|r| ReplyRow {
            date: r
                .created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            author: r.author.clone(),
            message: r.message.clone(),
        })
        .collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// Show book status
fn cmd_status(cfg_dir: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let customers = load_customers(cfg_dir)?;
    let products = load_products(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let (_, pool) = PoolStore::open(cfg_dir)?;

    let next = pool.peek(&active_numbers(&state.invoices));
    let next_number =
        format_invoice_number(&config.invoice.prefix, config.invoice.number_width, next);

    println!("Billing Status");
    println!("{}", "-".repeat(50));
    println!("Config directory: {}", cfg_dir.display());
    println!("Company:          {}", config.company.name);
    println!("Customers:        {}", customers.len());
    println!("Products:         {}", products.len());
    println!("Invoices:         {}", state.invoices.len());
    println!("Deleted:          {}", state.deleted.len());
    println!("Freed numbers:    {}", pool.len());
    println!("Next invoice:     {}", next_number);

    if !state.invoices.is_empty() {
        println!();
        println!("Recent invoices:");
        for invoice in state.invoices.iter().rev().take(5) {
            println!(
                "  {} - {} - {}",
                invoice.number,
                customer_label(&customers, invoice.customer_id.as_deref()),
                format_money(invoice.total_amount, &config.invoice.currency_symbol)
            );
        }
    }

    Ok(())
}

/// Create a new invoice
fn cmd_create(
    cfg_dir: &Path,
    customer_id: &str,
    items: &[String],
    status: &str,
    notes: Option<String>,
) -> Result<()> {
    if items.is_empty() {
        return Err(BillingError::NoItems);
    }
    let status: InvoiceStatus = status.parse()?;

    let config = load_config(cfg_dir)?;
    let customers = load_customers(cfg_dir)?;
    let invoice = create_invoice(cfg_dir, customer_id, items, status, notes)?;

    println!("Created {}", invoice.number);
    println!(
        "  Customer: {}",
        customer_label(&customers, invoice.customer_id.as_deref())
    );
    println!(
        "  Total:    {}",
        format_money(invoice.total_amount, &config.invoice.currency_symbol)
    );
    if let Some(due) = invoice.due_date {
        println!("  Due:      {due}");
    }

    Ok(())
}

/// List invoices with a paid / outstanding footer
fn cmd_list(cfg_dir: &Path, limit: Option<usize>, status: Option<String>) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let customers = load_customers(cfg_dir)?;
    let state = load_state(cfg_dir)?;

    let status_filter: Option<InvoiceStatus> = status
        .as_deref()
        .map(|s| s.parse::<InvoiceStatus>())
        .transpose()?;

    if state.invoices.is_empty() {
        println!("No invoices created yet.");
        return Ok(());
    }

    let invoices: Vec<(usize, &Invoice)> = state
        .invoices
        .iter()
        .rev()
        .enumerate()
        .filter(|(_, inv)| status_filter.map_or(true, |s| inv.status == s))
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    if invoices.is_empty() {
        println!("No invoices match the given filters.");
        return Ok(());
    }

    let symbol = &config.invoice.currency_symbol;
    let rows: Vec<InvoiceRow> = invoices
        .iter()
        .map(|(idx, inv)| InvoiceRow {
            index: idx + 1,
            number: inv.number.clone(),
            date: inv.date.to_string(),
            total: format_money(inv.total_amount, symbol),
            status: inv.status.to_string(),
            customer: customer_label(&customers, inv.customer_id.as_deref()),
        })
        .collect();

    let sum_where = |pred: &dyn Fn(InvoiceStatus) -> bool| -> f64 {
        invoices
            .iter()
            .filter(|(_, inv)| pred(inv.status))
            .map(|(_, inv)| inv.total_amount)
            .sum()
    };
    let shown_total = sum_where(&|_| true);
    let shown_paid = sum_where(&|s| s == InvoiceStatus::Paid);
    let shown_outstanding =
        sum_where(&|s| matches!(s, InvoiceStatus::Pending | InvoiceStatus::Overdue));

    let table = Table::new(rows).with(Style::rounded()).to_string();
    let table = add_summary_footer(
        &table,
        &[
            ("TOTAL", format_money(shown_total, symbol)),
            ("PAID", format_money(shown_paid, symbol)),
            ("OUTSTANDING", format_money(shown_outstanding, symbol)),
        ],
    );
    println!("{table}");

    println!();
    println!("Total: {} invoices", state.invoices.len());
    println!("Use index number with show/edit/set-status/mark-paid/delete (e.g., 'billsync show 1')");

    Ok(())
}

/// Show one invoice
fn cmd_show(cfg_dir: &Path, invoice_ref: &str) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let customers = load_customers(cfg_dir)?;
    let state = load_state(cfg_dir)?;

    let number = resolve_invoice_number(&state, invoice_ref)?;
    let invoice = state
        .find(&number)
        .ok_or_else(|| BillingError::InvoiceNotFound(number.clone()))?;
    let symbol = &config.invoice.currency_symbol;

    println!("Invoice {}", invoice.number);
    println!(
        "  Customer: {}",
        customer_label(&customers, invoice.customer_id.as_deref())
    );
    println!("  Date:     {}", invoice.date);
    if let Some(due) = invoice.due_date {
        println!("  Due:      {due}");
    }
    println!("  Status:   {}", invoice.status);
    if let Some(notes) = &invoice.notes {
        println!("  Notes:    {notes}");
    }

    if !invoice.items.is_empty() {
        let rows: Vec<LineRow> = invoice
            .items
            .iter()
            .map(|item| LineRow {
                product: item.product_name.clone(),
                quantity: format!("{}", item.quantity),
                price: format_money(item.unit_price, symbol),
                amount: format_money(item.total_price, symbol),
            })
            .collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    println!("  Subtotal: {}", format_money(invoice.subtotal, symbol));
    println!("  Tax:      {}", format_money(invoice.tax_amount, symbol));
    println!("  Total:    {}", format_money(invoice.total_amount, symbol));

    Ok(())
}

/// Replace the line items of an invoice
fn cmd_edit(cfg_dir: &Path, invoice_ref: &str, items: &[String]) -> Result<()> {
    if items.is_empty() {
        return Err(BillingError::NoItems);
    }

    let state = load_state(cfg_dir)?;
    let number = resolve_invoice_number(&state, invoice_ref)?;
    let config = load_config(cfg_dir)?;
    let invoice = edit_invoice(cfg_dir, &number, items)?;

    println!("Updated {}", invoice.number);
    println!("  Items:  {}", items.join(", "));
    println!(
        "  Total:  {}",
        format_money(invoice.total_amount, &config.invoice.currency_symbol)
    );

    Ok(())
}

fn cmd_set_status(cfg_dir: &Path, invoice_ref: &str, status: &str) -> Result<()> {
    let status: InvoiceStatus = status.parse()?;
    let state = load_state(cfg_dir)?;
    let number = resolve_invoice_number(&state, invoice_ref)?;

    let invoice = set_status(cfg_dir, &number, status)?;
    println!("Marked {} as {}", invoice.number, invoice.status);

    Ok(())
}

fn cmd_delete(cfg_dir: &Path, invoice_ref: &str) -> Result<()> {
    let state = load_state(cfg_dir)?;
    let number = resolve_invoice_number(&state, invoice_ref)?;

    let archived = delete_invoice(cfg_dir, &number)?;
    println!("Deleted {}", archived.invoice.number);
    println!("  Moved to deleted invoices; its number is free for reuse.");

    Ok(())
}

/// List the deleted-invoice archive, newest first
fn cmd_deleted(cfg_dir: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let customers = load_customers(cfg_dir)?;
    let state = load_state(cfg_dir)?;

    if state.deleted.is_empty() {
        println!("No deleted invoices.");
        return Ok(());
    }

    let rows: Vec<DeletedRow> = state
        .deleted
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, archived)| DeletedRow {
            index: idx + 1,
            number: archived.invoice.number.clone(),
            customer: customer_label(&customers, archived.invoice.customer_id.as_deref()),
            date: archived.invoice.date.to_string(),
            status: archived.invoice.status.to_string(),
            total: format_money(
                archived.invoice.total_amount,
                &config.invoice.currency_symbol,
            ),
            deleted_at: archived
                .deleted_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    println!("Use 'billsync restore <number>' to bring an invoice back.");

    Ok(())
}

fn cmd_restore(cfg_dir: &Path, invoice_ref: &str) -> Result<()> {
    let state = load_state(cfg_dir)?;
    let number = resolve_archived_number(&state, invoice_ref)?;
    let config = load_config(cfg_dir)?;

    let invoice = restore_invoice(cfg_dir, &number)?;
    println!("Restored {}", invoice.number);
    println!(
        "  Total:  {}",
        format_money(invoice.total_amount, &config.invoice.currency_symbol)
    );

    Ok(())
}

fn cmd_pool(cfg_dir: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let (store, pool) = PoolStore::open(cfg_dir)?;

    if pool.is_empty() {
        println!("No freed invoice numbers.");
        return Ok(());
    }

    println!("Freed invoice numbers (reused smallest first):");
    for number in pool.iter() {
        println!(
            "  {}",
            format_invoice_number(&config.invoice.prefix, config.invoice.number_width, number)
        );
    }
    println!("Pool revision: {}", store.revision());

    Ok(())
}

/// Profit per customer
fn cmd_profit(cfg_dir: &Path, sort: &str, asc: bool, search: Option<String>) -> Result<()> {
    let sort_key: SortKey = sort.parse()?;
    let direction = if asc {
        SortDirection::Ascending
    } else {
        SortDirection::Descending
    };

    let config = load_config(cfg_dir)?;
    let customers = load_customers(cfg_dir)?;
    let products = load_products(cfg_dir)?;
    let state = load_state(cfg_dir)?;

    let summary = compute_profit_summary(
        &state.invoices,
        |product_id| {
            products
                .get(product_id)
                .map_or(CostBasis::Unknown, |p| p.cost_basis())
        },
        |customer_id| customers.get(customer_id).map(|c| c.name.clone()),
    );

    let symbol = &config.invoice.currency_symbol;
    println!(
        "Overall profit: {}",
        format_money(summary.overall_profit, symbol)
    );

    let mut per_client = match search.as_deref() {
        Some(query) => filter_clients(summary.per_client, query),
        None => summary.per_client,
    };
    if per_client.is_empty() {
        println!("No customers to show.");
        return Ok(());
    }
    sort_clients(&mut per_client, sort_key, direction);

    let rows: Vec<ProfitRow> = per_client
        .iter()
        .map(|row| ProfitRow {
            customer: row.customer_name.clone(),
            invoices: row.invoice_count,
            revenue: format_money(row.revenue, symbol),
            profit: format_money(row.profit, symbol),
            margin: format!("{:.2}%", row.margin_pct),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// Monthly sales report
fn cmd_sales(
    cfg_dir: &Path,
    month: Option<String>,
    customer_id: Option<String>,
    csv: bool,
) -> Result<()> {
    let month: Month = match month {
        Some(m) => m.parse()?,
        None => Month::of(Local::now().date_naive()),
    };

    let config = load_config(cfg_dir)?;
    let customers = load_customers(cfg_dir)?;
    let state = load_state(cfg_dir)?;

    if let Some(id) = customer_id.as_deref() {
        if !customers.contains_key(id) {
            return Err(BillingError::CustomerNotFound(id.to_string()));
        }
    }

    let report = sales_report(&state.invoices, month, customer_id.as_deref());
    let symbol = &config.invoice.currency_symbol;

    println!("Sales report for {}", report.month);
    println!(
        "  Customer: {}",
        match report.customer_id.as_deref() {
            Some(id) => customer_label(&customers, Some(id)),
            None => "All customers".to_string(),
        }
    );
    println!("  Invoices: {}", report.count());
    println!("  Total:    {}", format_money(report.total_amount, symbol));
    println!("  Paid:     {}", format_money(report.paid, symbol));
    println!("  Pending:  {}", format_money(report.pending, symbol));

    if !report.invoices.is_empty() {
        let rows: Vec<SalesRow> = report
            .invoices
            .iter()
            .map(|inv| SalesRow {
                number: inv.number.clone(),
                customer: customer_label(&customers, inv.customer_id.as_deref()),
                date: inv.date.to_string(),
                due: inv.due_date.map(|d| d.to_string()).unwrap_or_default(),
                status: inv.status.to_string(),
                amount: format_money(inv.total_amount, symbol),
            })
            .collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    if csv {
        let output_dir = resolve_output_dir(&config.export.output_dir, cfg_dir);
        std::fs::create_dir_all(&output_dir)?;
        let path = output_dir.join(report.file_name());
        let csv = report.to_csv(|id| customers.get(id).map(|c| c.name.clone()))?;
        std::fs::write(&path, csv)?;
        println!("  Saved:    {}", path.display());
    }

    Ok(())
}

fn cmd_stats(cfg_dir: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let state = load_state(cfg_dir)?;
    let stats = invoice_stats(&state.invoices);
    let symbol = &config.invoice.currency_symbol;

    println!("Invoices: {}", stats.count);
    println!("Subtotal: {}", format_money(stats.subtotal, symbol));
    println!("Tax:      {}", format_money(stats.tax_amount, symbol));
    println!("Total:    {}", format_money(stats.total_amount, symbol));

    Ok(())
}
