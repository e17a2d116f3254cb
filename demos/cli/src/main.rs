use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use referral_analysis::{DocumentAnalyzer, ReferralDraft};
use referral_core::{ReferralConfig, UploadedFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "referral-cli",
    about = "Phân tích tài liệu chuyển tuyến, tính lộ trình RTT và migrate dữ liệu mẫu."
)]
struct Args {
    /// Đường dẫn tới file cấu hình JSON.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Phân tích lần lượt các tệp rồi gộp kết quả.
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Bỏ qua độ trễ giả lập.
        #[arg(long)]
        no_delay: bool,
        /// In payload tạo giấy chuyển tuyến thay vì kết quả gộp.
        #[arg(long)]
        draft: bool,
    },
    /// Gộp mảng kết quả phân tích (JSON).
    Merge {
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Tính lộ trình RTT.
    Rtt {
        /// Ngày bắt đầu (YYYY-MM-DD).
        #[arg(long)]
        clock_start: NaiveDate,
        /// Ngày tham chiếu, mặc định hôm nay.
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Migrate bộ dữ liệu mẫu sang các bảng quan hệ.
    Migrate {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("referral=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let today_default = Utc::now().date_naive();

    match args.command {
        Command::Analyze {
            files,
            no_delay,
            draft,
        } => {
            let mut analysis = config.analysis.clone();
            if no_delay {
                analysis.simulated_delay_ms = 0;
            }

            let uploads = files
                .iter()
                .map(|path| describe_upload(path))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let analyzer = DocumentAnalyzer::new(analysis);
            let merged = analyzer.analyze_batch(&uploads, |step| {
                eprintln!("[{}/{}] {}", step.completed, step.total, step.file_name);
            })?;

            if draft {
                let payload =
                    ReferralDraft::from_analysis(&merged, Utc::now(), today_default, &config.rtt)?;
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&merged)?);
            }
        }
        Command::Merge { input } => {
            let data = std::fs::read_to_string(&input)
                .with_context(|| format!("Không đọc được file {:?}", input))?;
            let merged = referral_analysis::merge_json_str(&data)?;
            println!("{}", serde_json::to_string_pretty(&merged)?);
        }
        Command::Rtt { clock_start, today } => {
            let pathway = referral_core::calculate_pathway(
                clock_start,
                today.unwrap_or(today_default),
                &config.rtt,
            )?;
            println!(
                "Clock start: {}\nTarget date: {}\nDays remaining: {}\nBreach risk: {}",
                pathway.clock_start,
                pathway.target_date,
                pathway.days_remaining,
                pathway.breach_risk.as_str()
            );
        }
        Command::Migrate {
            input,
            output,
            today,
        } => {
            let data = std::fs::read_to_string(&input)
                .with_context(|| format!("Không đọc được file {:?}", input))?;
            let outcome = referral_migrate::migrate_json_str(
                &data,
                today.unwrap_or(today_default),
                &config.rtt,
            )?;

            let report = &outcome.report;
            println!(
                "Practitioners: {}\nPatients: {} ({} duplicates folded)\nReferrals: {}\nAllergies: {}\nMedications: {}\nRTT pathways: {}\nSkipped rows: {}",
                report.practitioners,
                report.patients,
                report.duplicate_patients,
                report.referrals,
                report.allergies,
                report.medications,
                report.rtt_pathways,
                report.failures.len()
            );

            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&outcome)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Không ghi được file {:?}", path))?;
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ReferralConfig> {
    let Some(path) = path else {
        return Ok(ReferralConfig::default());
    };
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Không đọc được file cấu hình {:?}", path))?;
    ReferralConfig::from_json_str(&data)
        .with_context(|| format!("Cấu hình không hợp lệ {:?}", path))
}

fn describe_upload(path: &Path) -> anyhow::Result<UploadedFile> {
    let metadata =
        std::fs::metadata(path).with_context(|| format!("Không đọc được file {:?}", path))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Ok(UploadedFile::new(name, metadata.len(), mime_type))
}
