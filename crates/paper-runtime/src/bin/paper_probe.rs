use clap::{Parser, ValueEnum};
use std::net::UdpSocket;
use std::thread;
use std::time::Duration;

use paper_core::OscFraming;
use paper_wire::encode_float;

/// PaperTracker probe - Send test OSC streams to a running module
#[derive(Parser, Debug)]
#[command(name = "paper-probe", version, long_about = None)]
struct Args {
    /// What to send
    #[arg(long, value_enum, default_value_t = Mode::Face)]
    mode: Mode,

    /// Destination host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Destination port (default: 8888 for face/continuous, 8889 for eye)
    #[arg(long)]
    port: Option<u16>,

    /// Delay between messages in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Datagram framing
    #[arg(long, value_enum, default_value_t = Framing::Unpadded)]
    framing: Framing,

    /// Eye address dialect
    #[arg(long, value_enum, default_value_t = Dialect::V1)]
    dialect: Dialect,

    /// Stop continuous mode after this many messages
    #[arg(long)]
    count: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Face,
    Eye,
    Continuous,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Framing {
    Unpadded,
    Aligned,
}

impl From<Framing> for OscFraming {
    fn from(framing: Framing) -> Self {
        match framing {
            Framing::Unpadded => OscFraming::Unpadded,
            Framing::Aligned => OscFraming::Aligned,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Dialect {
    V1,
    V2,
}

const FACE_MESSAGES: &[(&str, f32)] = &[
    ("/jawOpen", 0.5),
    ("/mouthSmileLeft", 0.3),
    ("/mouthSmileRight", 0.3),
    ("/mouthFrownLeft", 0.1),
    ("/mouthFrownRight", 0.1),
    ("/cheekPuffLeft", 0.2),
    ("/cheekPuffRight", 0.2),
    ("/tongueOut", 0.4),
    ("/mouthFunnel", 0.3),
    ("/mouthPucker", 0.2),
];

const EYE_V1_MESSAGES: &[(&str, f32)] = &[
    ("/RightEyeLidExpandedSqueeze", 0.8),
    ("/LeftEyeLidExpandedSqueeze", 0.8),
    ("/RightEyeX", 0.1),
    ("/LeftEyeX", -0.1),
    ("/EyesY", 0.2),
    ("/EyesDilation", 0.6),
];

const EYE_V2_MESSAGES: &[(&str, f32)] = &[
    ("/avatar/parameters/v2/EyeLidRight", 0.8),
    ("/avatar/parameters/v2/EyeLidLeft", 0.8),
    ("/avatar/parameters/v2/EyeRightX", 0.1),
    ("/avatar/parameters/v2/EyeRightY", 0.2),
    ("/avatar/parameters/v2/EyeLeftX", -0.1),
    ("/avatar/parameters/v2/EyeLeftY", 0.2),
    ("/avatar/parameters/v2/PupilDilation", 0.6),
];

struct Probe {
    socket: UdpSocket,
    target: String,
    framing: OscFraming,
}

impl Probe {
    fn send(&self, address: &str, value: f32) -> Result<(), Box<dyn std::error::Error>> {
        let datagram = encode_float(address, value, self.framing)?;
        self.socket.send_to(&datagram, &self.target)?;
        Ok(())
    }

    fn send_all(&self, messages: &[(&str, f32)], interval: Duration) {
        let total = messages.len();
        for (i, (address, value)) in messages.iter().enumerate() {
            println!("Sending {}/{}: {} = {}", i + 1, total, address, value);
            if let Err(e) = self.send(address, *value) {
                eprintln!("Failed to send {}: {}", address, e);
            }
            thread::sleep(interval);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let port = args.port.unwrap_or(match args.mode {
        Mode::Eye => 8889,
        Mode::Face | Mode::Continuous => 8888,
    });
    let interval = Duration::from_millis(args.interval_ms.unwrap_or(match args.mode {
        Mode::Continuous => 1000,
        Mode::Face | Mode::Eye => 500,
    }));

    let probe = Probe {
        socket: UdpSocket::bind("0.0.0.0:0")?,
        target: format!("{}:{}", args.host, port),
        framing: args.framing.into(),
    };
    println!("Sending {:?} messages to {}", args.mode, probe.target);

    match args.mode {
        Mode::Face => probe.send_all(FACE_MESSAGES, interval),
        Mode::Eye => match args.dialect {
            Dialect::V1 => probe.send_all(EYE_V1_MESSAGES, interval),
            Dialect::V2 => probe.send_all(EYE_V2_MESSAGES, interval),
        },
        Mode::Continuous => {
            let mut counter: u64 = 0;
            while args.count.map_or(true, |limit| counter < limit) {
                let value = (counter % 100) as f32 / 100.0;
                probe.send("/jawOpen", value)?;
                println!("Sent /jawOpen = {:.2}", value);
                counter += 1;
                thread::sleep(interval);
            }
        }
    }

    println!("Done");
    Ok(())
}
