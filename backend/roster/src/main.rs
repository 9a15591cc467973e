use clap::{Parser, Subcommand};
use server::{
    database::RedisStore,
    models::Participant,
    roster::{self, position},
    store::Store,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    redis_url: String,

    /// Admin listed while no roster is stored
    #[arg(long, env = "BOOTSTRAP_ADMIN", default_value = "Admin")]
    bootstrap_admin: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the stored roster
    List,

    /// Add a participant
    Add {
        name: String,

        #[arg(long)]
        admin: bool,
    },

    /// Remove a participant by name
    Remove { name: String },

    /// Grant or revoke admin by name
    ToggleAdmin { name: String },
}

fn print_roster(roster: &[Participant]) {
    for (index, participant) in roster.iter().enumerate() {
        let badge = if participant.is_admin { " (admin)" } else { "" };
        println!("{index:>3}  {}{badge}", participant.name);
    }

    println!("\n{} participants", roster.len());
}

async fn index_of(store: &dyn Store, bootstrap_admin: &str, name: &str) -> anyhow::Result<usize> {
    let current = roster::list_participants(store, bootstrap_admin).await?;

    position(&current, name).ok_or_else(|| anyhow::anyhow!("{name} is not in the roster"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let store = RedisStore::connect(&args.redis_url).await?;
    let bootstrap = args.bootstrap_admin.as_str();

    let updated = match args.command {
        Command::List => roster::list_participants(&store, bootstrap).await?,
        Command::Add { name, admin } => {
            roster::add_participant(&store, bootstrap, &name, admin).await?
        }
        Command::Remove { name } => {
            let index = index_of(&store, bootstrap, &name).await?;
            roster::remove_participant(&store, bootstrap, index).await?
        }
        Command::ToggleAdmin { name } => {
            let index = index_of(&store, bootstrap, &name).await?;
            roster::toggle_admin(&store, bootstrap, index).await?
        }
    };

    print_roster(&updated);

    Ok(())
}
