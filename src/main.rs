// Entry point and interactive console flow.
//
// - Option [1] loads the WHO dataset and prints load diagnostics.
// - Option [2] picks the country to analyse.
// - Option [3] runs the forecast pipeline for that country, prints the
//   analytics and summary, and exports the forecast, chart, and summary files.
// After a report the user can go back to the menu or exit.
use spread_report::config::DashboardConfig;
use spread_report::forecast::AdditiveForecaster;
use spread_report::loader::SeriesRepository;
use spread_report::output;
use spread_report::pipeline::{generate_report, ReportRequest};
use spread_report::util;
use std::io::{self, Write};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Per-process state: the load-once dataset, the model, and the current
/// country choice. Forecasts are never kept between reports.
struct App {
    config: DashboardConfig,
    repo: SeriesRepository,
    forecaster: AdditiveForecaster,
    selected: Option<String>,
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// Returns `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Ask whether to go back to the menu after a report.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Menu (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        match io::stdin().read_line(&mut buf) {
            Ok(0) | Err(_) => return false,
            Ok(_) => {}
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

impl App {
    fn new(config: DashboardConfig) -> Self {
        let repo = SeriesRepository::new(&config.data_path);
        let forecaster = AdditiveForecaster::new(config.model.clone());
        Self {
            config,
            repo,
            forecaster,
            selected: None,
        }
    }

    /// Option [1]: read the dataset (first time only) and print diagnostics.
    fn handle_load(&mut self) {
        let already = self.repo.is_loaded();
        match self.repo.dataset() {
            Ok(data) => {
                let report = data.report();
                if already {
                    println!("Dataset already loaded.");
                }
                println!(
                    "Processing dataset... ({} rows read, {} observations across {} countries)",
                    util::format_int(report.total_rows),
                    util::format_int(report.loaded_rows),
                    util::format_int(report.countries)
                );
                if report.parse_errors > 0 {
                    println!(
                        "Note: {} rows skipped due to parse/validation errors.",
                        util::format_int(report.parse_errors)
                    );
                }
                if report.duplicates > 0 {
                    println!(
                        "Info: {} duplicate country/date rows replaced by later entries.",
                        util::format_int(report.duplicates)
                    );
                }
                println!();
                if self.selected.is_none() {
                    self.selected = data.countries().first().map(|c| c.to_string());
                }
            }
            Err(e) => eprintln!("{}\n", e.user_message()),
        }
    }

    /// Option [2]: choose a country by number or by name.
    fn handle_select(&mut self) {
        let countries = match self.repo.countries() {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{}\n", e.user_message());
                return;
            }
        };
        println!("Select a Country for Analysis:");
        for (i, c) in countries.iter().enumerate() {
            println!("[{}] {}", i + 1, c);
        }
        let Some(choice) = read_choice() else { return };
        let picked = match choice.parse::<usize>() {
            Ok(n) if (1..=countries.len()).contains(&n) => Some(countries[n - 1]),
            _ => countries
                .iter()
                .copied()
                .find(|c| c.eq_ignore_ascii_case(&choice)),
        };
        match picked {
            Some(c) => {
                println!("Selected: {}\n", c);
                self.selected = Some(c.to_string());
            }
            None => println!("Unknown country '{}'.\n", choice),
        }
    }

    /// Option [3]: run the pipeline and show the report.
    ///
    /// Nothing is printed or exported unless every stage succeeded.
    fn handle_generate_report(&mut self) {
        if self.selected.is_none() {
            // Same default as the selector: the first country.
            self.selected = self
                .repo
                .countries()
                .ok()
                .and_then(|c| c.first().map(|s| s.to_string()));
        }
        let Some(country) = self.selected.clone() else {
            // Loading failed; surface the reason.
            if let Err(e) = self.repo.dataset() {
                eprintln!("{}\n", e.user_message());
            }
            return;
        };

        println!("Calculating Forecast for {}...\n", country);
        let request = ReportRequest::from_config(&country, &self.config);
        let report = match generate_report(&self.repo, &self.forecaster, &request) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("{}\n", e.user_message());
                return;
            }
        };

        output::print_report(&report, self.config.preview_rows);
        match output::export_report(&report, Path::new(&self.config.output_dir)) {
            Ok(files) => println!(
                "(Full forecast exported to {}, chart to {}, summary to {})\n",
                files.forecast_csv.display(),
                files.chart_json.display(),
                files.summary_json.display()
            ),
            Err(e) => {
                tracing::error!("{}", e);
                eprintln!("{}\n", e.user_message());
            }
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = DashboardConfig::load();
    let mut app = App::new(config);

    println!("Disease Spread / COVID Analysis");
    println!("Bayesian Time-Series Forecasting for Epidemiological Trends\n");
    println!("Key Terms\n{}\n", output::KEY_TERMS);

    loop {
        println!("Select an action:");
        println!("[1] Load the dataset");
        println!("[2] Select a country");
        println!("[3] Generate Diagnostic Report\n");
        let Some(choice) = read_choice() else {
            println!("\nExiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => app.handle_load(),
            "2" => app.handle_select(),
            "3" => {
                println!();
                app.handle_generate_report();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}
