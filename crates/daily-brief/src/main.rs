use anyhow::{Context, Result};
use clap::Parser;
use shared::config::expand_home;
use shared::{
    compose_message, BriefComposer, BriefError, BriefLog, Config, GpgDecrypter,
    HackerNewsClient, JournalLocator, JournalReader, RankingPolicy, TracingLog,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

const RULE: &str = "========================";

enum Output {
    Brief(String),
    /// The prepared message from a dry run.
    Payload(String),
}

#[derive(Parser)]
#[command(name = "daily-brief")]
#[command(about = "Build a personal morning brief from your journal, goals and Hacker News")]
struct Args {
    /// Config file (defaults to ~/.config/daily-brief/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding journal files
    #[arg(long)]
    journal_dir: Option<PathBuf>,

    /// Number of recent journal entries to include
    #[arg(long)]
    journal_limit: Option<usize>,

    /// Number of top stories to fetch
    #[arg(short = 'n', long)]
    news_limit: Option<usize>,

    /// Drop stories scoring below this
    #[arg(long)]
    min_score: Option<u64>,

    /// Show at most this many stories
    #[arg(long)]
    max_stories: Option<usize>,

    /// Popular stories only (score >= 50, top 15)
    #[arg(long, conflicts_with_all = ["min_score", "max_stories"])]
    curated: bool,

    /// Print the prepared message instead of generating the brief
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.journal_dir {
            config.journal.dir = expand_home(dir);
        }
        if let Some(limit) = self.journal_limit {
            config.journal.limit = limit;
        }
        if let Some(limit) = self.news_limit {
            config.news.fetch_limit = limit;
        }
        if let Some(min) = self.min_score {
            config.news.min_score = Some(min);
        }
        if let Some(max) = self.max_stories {
            config.news.max_stories = Some(max);
        }
    }

    fn ranking_policy(&self, config: &Config) -> RankingPolicy {
        if self.curated {
            RankingPolicy::curated()
        } else {
            RankingPolicy {
                min_score: config.news.min_score,
                max_stories: config.news.max_stories,
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let args = Args::parse();
    shared::logging::init_cli();
    let log = TracingLog::shared();

    let output = match run(&args, log.clone()).await {
        Ok(output) => output,
        Err(e) => {
            let message = match e.downcast_ref::<BriefError>() {
                Some(err) if err.is_fatal() => {
                    format!("No journal data for today's brief: {}", err)
                }
                _ => format!("Error generating daily brief: {:#}", e),
            };
            log.error(&message);
            return Err(e);
        }
    };

    match output {
        Output::Brief(brief) => {
            println!("\n{}", RULE);
            println!("📱 YOUR DAILY BRIEF");
            println!("{}", RULE);
            println!("{}", brief);
            println!("{}\n", RULE);
        }
        Output::Payload(message) => println!("{}", message),
    }

    println!("Total run time: {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}

async fn run(args: &Args, log: Arc<dyn BriefLog>) -> Result<Output> {
    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    let config = Arc::new(config);

    log.info("Gathering data for daily brief...");

    // Directory scan and gpg are blocking; keep them off the runtime threads
    let journal = {
        let config = Arc::clone(&config);
        let log = Arc::clone(&log);
        tokio::task::spawn_blocking(move || -> Result<_> {
            let locator = JournalLocator::new(&config.journal, Arc::clone(&log));
            let files = locator.locate(config.journal.limit)?;

            let mut decrypter = GpgDecrypter::new(config.journal.gpg_program.clone());
            if let Some(home) = &config.journal.gpg_homedir {
                decrypter = decrypter.with_homedir(home.clone());
            }
            let reader = JournalReader::new(&config.journal, Arc::new(decrypter), log);
            Ok(reader.read_all(&files))
        })
        .await
        .context("Journal task panicked")??
    };

    let news_client = HackerNewsClient::new(&config.news, Arc::clone(&log))?;
    let news_summary = news_client
        .summary_text(config.news.fetch_limit, args.ranking_policy(&config))
        .await;

    if args.dry_run {
        return Ok(Output::Payload(compose_message(
            &journal,
            &config.goals,
            &news_summary,
        )));
    }

    let composer = BriefComposer::with_claude(
        &config.generator,
        config.anthropic_api_key.as_deref(),
        log,
    );
    let brief = composer
        .generate_brief(&journal, &config.goals, &news_summary)
        .await;

    Ok(Output::Brief(brief))
}
