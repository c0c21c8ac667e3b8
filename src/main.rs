use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{ArgEnum, Args, Parser, Subcommand};
use env_logger::{Builder, Env};
use log::{debug, info, LevelFilter};

use heart_risk::batch::{evaluate_file, predict_file};
use heart_risk::model::DEFAULT_MODEL_PATH;
use heart_risk::render::render_text;
use heart_risk::server::{serve, DEFAULT_BIND};
use heart_risk::{assess, load_cached, Features, HeartRiskError, RawFeatures};

#[tokio::main]
async fn main() -> Result<(), HeartRiskError> {
    let cli = HeartRiskArgs::parse();

    let log_level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let env = Env::new().filter("MLOG");
    Builder::new()
        .filter(Some("heart_risk"), log_level)
        .parse_env(env)
        .init();

    debug!("Arguments {:#?}", cli);

    heart_risk_app(cli).await
}

#[derive(Parser, Debug)]
#[clap(author, version, about = "Heart disease risk predictor", long_about = None)]
#[clap(propagate_version = true)]
pub struct HeartRiskArgs {
    #[clap(short, long, parse(from_occurrences), global = true, help = "Verbose level")]
    verbose: usize,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the prediction form over HTTP
    Serve {
        #[clap(short, long, parse(from_os_str), default_value = DEFAULT_MODEL_PATH,
        help = "Model artifact")]
        model: PathBuf,
        #[clap(short, long, default_value = DEFAULT_BIND, help = "Listen address")]
        bind: SocketAddr,
    },
    /// Predict a single patient; omitted inputs take the form defaults
    Predict {
        #[clap(short, long, parse(from_os_str), default_value = DEFAULT_MODEL_PATH,
        help = "Model artifact")]
        model: PathBuf,
        #[clap(flatten)]
        inputs: InputArgs,
        #[clap(short, long, arg_enum, default_value_t = OutputFormat::Text,
        help = "Output format")]
        format: OutputFormat,
    },
    /// Predict every row of a CSV file
    Batch {
        #[clap(short, long, parse(from_os_str), default_value = DEFAULT_MODEL_PATH,
        help = "Model artifact")]
        model: PathBuf,
        #[clap(short, long, parse(from_os_str), help = "Input path")]
        input: PathBuf,
        #[clap(short, long, parse(from_os_str), help = "Output path")]
        output: PathBuf,
    },
    /// Report the accuracy of the model on a labelled CSV file
    Evaluate {
        #[clap(short, long, parse(from_os_str), default_value = DEFAULT_MODEL_PATH,
        help = "Model artifact")]
        model: PathBuf,
        #[clap(short, long, parse(from_os_str), help = "Input path")]
        input: PathBuf,
        #[clap(short, long, arg_enum, default_value_t = OutputFormat::Text,
        help = "Output format")]
        format: OutputFormat,
    },
}

#[derive(Debug, PartialEq, Eq, Clone, ArgEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
struct InputArgs {
    #[clap(long, help = "Age (years), 18-100")]
    age: Option<i64>,
    #[clap(long, help = "Sex: 1 male, 0 female")]
    sex: Option<i64>,
    #[clap(long, help = "Chest pain type, 0-3")]
    cp: Option<i64>,
    #[clap(long, help = "Resting blood pressure (mm Hg), 94-200")]
    trestbps: Option<i64>,
    #[clap(long, help = "Cholesterol (mg/dl), 126-564")]
    chol: Option<i64>,
    #[clap(long, help = "Fasting blood sugar > 120 mg/dl: 1 yes, 0 no")]
    fbs: Option<i64>,
    #[clap(long, help = "Resting ECG, 0-2")]
    restecg: Option<i64>,
    #[clap(long, help = "Max heart rate achieved, 71-202")]
    thalach: Option<i64>,
    #[clap(long, help = "Exercise-induced angina: 1 yes, 0 no")]
    exang: Option<i64>,
    #[clap(long, help = "ST depression, 0.0-6.2")]
    oldpeak: Option<f64>,
    #[clap(long, help = "ST segment slope, 0-2")]
    slope: Option<i64>,
    #[clap(long, help = "Major vessels (fluoroscopy), 0-4")]
    ca: Option<i64>,
    #[clap(long, help = "Thalassemia: 1 normal, 2 fixed, 3 reversible")]
    thal: Option<i64>,
}

impl InputArgs {
    fn to_raw(&self) -> Result<RawFeatures, HeartRiskError> {
        let int = |v: Option<i64>| v.map(|v| v as f64);
        let given = [
            ("age", int(self.age)),
            ("sex", int(self.sex)),
            ("cp", int(self.cp)),
            ("trestbps", int(self.trestbps)),
            ("chol", int(self.chol)),
            ("fbs", int(self.fbs)),
            ("restecg", int(self.restecg)),
            ("thalach", int(self.thalach)),
            ("exang", int(self.exang)),
            ("oldpeak", self.oldpeak),
            ("slope", int(self.slope)),
            ("ca", int(self.ca)),
            ("thal", int(self.thal)),
        ];
        RawFeatures::from_named(
            given
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v))),
        )
    }
}

async fn heart_risk_app(opts: HeartRiskArgs) -> Result<(), HeartRiskError> {
    match opts.command {
        Command::Serve { model, bind } => {
            let model = load_cached(&model)?;
            serve(bind, model).await?;
        }
        Command::Predict {
            model,
            inputs,
            format,
        } => {
            let model = load_cached(&model)?;
            let features = Features::try_from(inputs.to_raw()?)?;
            let assessment = assess(model.as_ref(), &features)?;
            match format {
                OutputFormat::Text => print!("{}", render_text(&assessment)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&assessment)?),
            }
        }
        Command::Batch {
            model,
            input,
            output,
        } => {
            let model = load_cached(&model)?;
            let summary = predict_file(model.as_ref(), &input, &output)?;
            println!(
                "{} rows, {} predicted ({} high risk), {} skipped",
                summary.rows, summary.predicted, summary.high_risk, summary.skipped
            );
        }
        Command::Evaluate {
            model,
            input,
            format,
        } => {
            let model = load_cached(&model)?;
            let evaluation = evaluate_file(model.as_ref(), &input)?;
            info!("evaluated {:?} on {:?}", model.model_name, input);
            match format {
                OutputFormat::Text => {
                    println!("Rows: {}", evaluation.rows);
                    println!("Accuracy: {:.1}%", evaluation.accuracy * 100.0);
                    println!("Predicted positive: {:.1}%", evaluation.positive_rate * 100.0);
                    println!("Time elapsed: {:?}", evaluation.elapsed);
                    if let Some(bytes) = evaluation.memory_bytes {
                        println!("Memory used: {} KiB", bytes / 1024);
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&evaluation)?),
            }
        }
    }
    Ok(())
}
