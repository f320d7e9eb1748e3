use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facepause_core::{
    visualize_faces, BlazeFaceDetector, DrawingSurface, FaceEstimator, ImageCanvas,
    BLAZEFACE_MODEL_FILE,
};
use facepause_hw::{Camera, CaptureRequest};
use std::path::PathBuf;

const WARMUP_FRAMES: usize = 2;

#[zbus::proxy(
    interface = "org.facepause.Daemon1",
    default_service = "org.facepause.Daemon1",
    default_path = "/org/facepause/Daemon1"
)]
trait Facepause {
    async fn toggle(&self) -> zbus::Result<bool>;

    async fn status(&self) -> zbus::Result<String>;

    async fn snapshot(&self, path: &str) -> zbus::Result<()>;
}

#[derive(Parser)]
#[command(name = "facepause", about = "Pause video playback when nobody is watching")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start or stop face detection
    Toggle,
    /// Show daemon status
    Status,
    /// Save the current detection overlay as PNG
    Snapshot {
        /// Output file
        path: PathBuf,
    },
    /// List video capture devices
    Devices,
    /// Capture one frame, detect faces and save the overlay (bypasses the daemon)
    Test {
        /// Camera device (default: user-facing camera)
        #[arg(short, long)]
        device: Option<String>,
        /// Directory containing the BlazeFace model
        #[arg(long)]
        model_dir: Option<PathBuf>,
        /// Output PNG
        #[arg(short, long, default_value = "facepause-test.png")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Toggle => {
            let proxy = daemon().await?;
            let detecting = proxy.toggle().await?;
            println!("{}", if detecting { "detecting" } else { "idle" });
        }
        Commands::Status => {
            let proxy = daemon().await?;
            let status: serde_json::Value = serde_json::from_str(&proxy.status().await?)?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Snapshot { path } => {
            // The daemon writes the file, so hand it an absolute path.
            let path = if path.is_absolute() {
                path
            } else {
                std::env::current_dir()?.join(path)
            };
            let proxy = daemon().await?;
            proxy.snapshot(&path.to_string_lossy()).await?;
            println!("Snapshot saved to {}", path.display());
        }
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("No video capture devices found");
            } else {
                println!("{}", serde_json::to_string_pretty(&devices)?);
            }
        }
        Commands::Test {
            device,
            model_dir,
            output,
        } => run_test(device, model_dir, output)?,
    }

    Ok(())
}

async fn daemon() -> Result<FacepauseProxy<'static>> {
    let conn = zbus::Connection::session()
        .await
        .context("failed to connect to the session bus")?;
    FacepauseProxy::new(&conn)
        .await
        .context("facepaused is not reachable")
}

fn run_test(device: Option<String>, model_dir: Option<PathBuf>, output: PathBuf) -> Result<()> {
    let request = CaptureRequest::default();
    let camera = match &device {
        Some(path) => Camera::open(path, &request)?,
        None => Camera::open_user_facing(&request)?,
    };
    println!(
        "Camera: {} ({}x{}, {:?})",
        camera.device_path, camera.width, camera.height, camera.fourcc
    );

    let model_dir = model_dir
        .or_else(|| std::env::var("FACEPAUSE_MODEL_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(facepause_core::default_model_dir);
    let model_path = model_dir.join(BLAZEFACE_MODEL_FILE);
    let mut detector = BlazeFaceDetector::load(&model_path.to_string_lossy())
        .with_context(|| format!("failed to load {}", model_path.display()))?;

    for _ in 0..WARMUP_FRAMES {
        let _ = camera.capture();
    }
    let frame = camera.capture()?;
    let faces = detector.estimate_faces(&frame.data, frame.width, frame.height)?;
    println!("Faces detected: {}", faces.len());
    for face in &faces {
        println!(
            "  ({:.0}, {:.0}) - ({:.0}, {:.0})  p={:.2}",
            face.top_left[0],
            face.top_left[1],
            face.bottom_right[0],
            face.bottom_right[1],
            face.probability
        );
    }

    let image = frame
        .to_rgb_image()
        .context("captured frame is shorter than its dimensions")?;
    let mut canvas = ImageCanvas::new(frame.width, frame.height);
    visualize_faces(&mut canvas, &image, &faces);
    canvas.save_png(&output)?;
    let size = canvas.dimensions();
    println!(
        "Overlay ({}x{}) saved to {}",
        size.width,
        size.height,
        output.display()
    );

    Ok(())
}
