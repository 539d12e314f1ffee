use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let series_id = || clap::arg!([SERIES_ID] "Series slug, e.g. shadow-slave");

    let mut cmd = clap::Command::new("novelry")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Novelry Contributors")
        .about("Import web novel metadata and chapters as JSON")
        .subcommand(clap::Command::new("import-novel").about("Merged metadata for a series").arg(series_id()))
        .subcommand(
            clap::Command::new("import-chapter")
                .about("Title and body of one chapter")
                .arg(series_id())
                .arg(clap::arg!([CHAPTER_NO] "Chapter number, e.g. 12")),
        )
        .subcommand(
            clap::Command::new("search")
                .about("Search the series finder")
                .arg(clap::arg!([QUERY] ... "Free-text query")),
        )
        .subcommand(clap::Command::new("feed").about("Latest translated releases"))
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").global(true).default_value("10"))
        .arg(
            clap::arg!(--render_timeout <SECS> "Page load timeout for headless rendering in seconds")
                .global(true)
                .default_value("10"),
        )
        .arg(clap::arg!(--deadline <SECS> "Overall time limit for one command in seconds").global(true).default_value("90"))
        .arg(clap::arg!(--proxy_list_url <URL> "Endpoint serving the proxy list").global(true))
        .arg(clap::arg!(--no_proxies "Connect directly instead of through public proxies").global(true))
        .arg(clap::arg!(--user_agent <UA> "Fixed User-Agent instead of a rotating browser identity").global(true))
        .arg(clap::arg!(--seed <SEED> "Seed for proxy and identity selection").global(true))
        .arg(
            clap::arg!(--chromium <PATH> "Chromium executable for rendered sources")
                .global(true)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--pretty "Pretty-print JSON output").global(true))
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .arg(
            clap::arg!(--completions <SHELL> "Generate shell completion script")
                .value_name("SHELL")
                .value_parser(["bash", "zsh", "fish", "powershell"]),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "novelry", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "novelry", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "novelry", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "novelry", &completions_dir).unwrap();

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}
