use anyhow::{bail, Result};
use rharvest::{init_tracing_once, write_thread_jsonl_to_path, HarvestOptions, Harvester};
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "usage: rharvest <thread-url> [--out <comments.jsonl>]\n       rharvest <input.csv> <output.csv>";

fn main() -> Result<ExitCode> {
    init_tracing_once();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let opts = HarvestOptions::from_env();

    match args.as_slice() {
        [url] if is_http(url) => {
            let harvester = Harvester::from_options(opts.with_progress(false))?;
            let thread = harvester.scrape(url)?;
            println!("subreddit={:?}", thread.subreddit());
            println!("title={:?}", thread.title());
            println!("post_id={:?}", thread.post_id());
            println!("comments={} (reported {})", thread.comments().len(), thread.num_comments());
            if let Some(first) = thread.comments().first() {
                let preview: String = first.body().chars().take(200).collect();
                println!("first_comment_body_preview={}", preview.replace('\n', " "));
            }
            Ok(ExitCode::SUCCESS)
        }
        [url, flag, out] if flag == "--out" && is_http(url) => {
            let harvester = Harvester::from_options(opts.with_progress(false))?;
            let thread = harvester.scrape(url)?;
            let lines = write_thread_jsonl_to_path(&PathBuf::from(out), &thread)?;
            println!("wrote {lines} comments to {out}");
            Ok(ExitCode::SUCCESS)
        }
        [input, output] => {
            let harvester = Harvester::from_options(opts)?;
            let report = harvester.scrape_csv(&PathBuf::from(input), &PathBuf::from(output))?;
            println!("{}", report.summary());
            Ok(if report.failures.is_empty() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        _ => bail!("{USAGE}"),
    }
}

fn is_http(arg: &str) -> bool {
    arg.starts_with("http://") || arg.starts_with("https://")
}
