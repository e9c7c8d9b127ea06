use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ldk")]
#[command(about = "LensDesk operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Settings commands
    Settings {
        #[command(subcommand)]
        cmd: SettingsCmd,
    },

    /// Write the unfulfilled-orders report for one catalog
    Export {
        /// MKL | MERIDIAN
        #[arg(long)]
        catalog: String,
    },

    /// Reminder commands
    Remind {
        #[command(subcommand)]
        cmd: RemindCmd,
    },

    /// Order listing
    Orders {
        #[command(subcommand)]
        cmd: OrdersCmd,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,
    /// Apply embedded migrations.
    Migrate,
}

#[derive(Subcommand)]
enum SettingsCmd {
    /// Print the settings hash and canonical JSON (creates defaults if missing)
    Show,
}

#[derive(Subcommand)]
enum RemindCmd {
    /// Evaluate reminder channels right now
    Check {
        /// MKL | MERIDIAN; both when omitted
        #[arg(long)]
        channel: Option<String>,
    },

    /// Suppress a channel for N minutes
    Snooze {
        #[arg(long)]
        channel: String,

        #[arg(long)]
        minutes: i64,
    },

    /// Mark every NOT_ORDERED order of a channel as ORDERED
    MarkOrdered {
        #[arg(long)]
        channel: String,
    },
}

#[derive(Subcommand)]
enum OrdersCmd {
    List {
        /// MKL | MERIDIAN
        #[arg(long)]
        catalog: String,

        /// Storage code or label
        #[arg(long)]
        status: Option<String>,

        /// Text filter (MKL only)
        #[arg(long)]
        query: Option<String>,
    },

    /// Create an MKL order from form text (`,` is accepted as decimal separator)
    AddMkl {
        #[arg(long)]
        fio: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        product: String,

        #[arg(long, allow_hyphen_values = true)]
        sph: String,

        #[arg(long, default_value = "", allow_hyphen_values = true)]
        cyl: String,

        #[arg(long, default_value = "")]
        ax: String,

        #[arg(long, default_value = "")]
        bc: String,

        #[arg(long, default_value = "1")]
        qty: String,

        #[arg(long, default_value = "")]
        comment: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = ldk_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = ldk_db::status(&pool).await?;
                    println!("db_ok={} has_orders_tables={}", s.ok, s.has_orders_tables);
                }
                DbCmd::Migrate => {
                    ldk_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::Settings { cmd } => match cmd {
            SettingsCmd::Show => commands::settings_show()?,
        },

        Commands::Export { catalog } => commands::export(&catalog).await?,

        Commands::Remind { cmd } => match cmd {
            RemindCmd::Check { channel } => commands::remind::check(channel.as_deref()).await?,
            RemindCmd::Snooze { channel, minutes } => {
                commands::remind::snooze(&channel, minutes).await?
            }
            RemindCmd::MarkOrdered { channel } => commands::remind::mark_ordered(&channel).await?,
        },

        Commands::Orders { cmd } => match cmd {
            OrdersCmd::List {
                catalog,
                status,
                query,
            } => commands::orders::list(&catalog, status.as_deref(), query).await?,
            OrdersCmd::AddMkl {
                fio,
                phone,
                product,
                sph,
                cyl,
                ax,
                bc,
                qty,
                comment,
            } => {
                let form = commands::orders::MklForm {
                    fio,
                    phone,
                    product,
                    sph,
                    cyl,
                    ax,
                    bc,
                    qty,
                    comment,
                };
                commands::orders::add_mkl(form).await?
            }
        },
    }

    Ok(())
}

/// Logs go to stderr so stdout stays `key=value` for scripts.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
