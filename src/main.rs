use crossbeam_channel as channel;
use roomsphere::{
    chart::ChartLayout,
    cli::{Config, Opt},
    fixture,
    monitor_data::MonitorData,
    source::{LiveStatus, SystemClock},
    Frame, Result, Visualizer,
};
use std::{
    io::{self, BufRead, BufReader},
    net::TcpStream,
    thread,
    time::{Duration, Instant},
};
use structopt::StructOpt;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Messages from the reader threads to the frame loop.
#[derive(Debug)]
enum Msg {
    /// A raw line from the sensor board.
    Live(String),
    /// A raw frame from the insights server, pasted on stdin.
    Insights(String),
    Command(Command),
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Mode(String),
    ToggleReplay,
    AddPerson,
    RemovePerson,
    NextShape,
    StandUp,
    StandDown,
    Status,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        Some(match line.trim() {
            "" => return None,
            "replay" | "r" => Command::ToggleReplay,
            "add" | "+" => Command::AddPerson,
            "remove" | "-" => Command::RemovePerson,
            "shape" => Command::NextShape,
            "up" => Command::StandUp,
            "down" => Command::StandDown,
            "status" | "s" => Command::Status,
            "quit" | "q" => Command::Quit,
            other => Command::Mode(other.to_owned()),
        })
    }
}

/// Main programm runner.
fn run(opts: Opt) -> Result {
    let config = Config::load(opts.config_file.as_ref())?;
    log::debug!("{:?}", config);

    let status = LiveStatus::new();
    let mut vis = Visualizer::new(&config, status.clone(), SystemClock);
    if let Some(path) = &opts.fixture {
        vis.set_fixture(fixture::load(path)?);
    }
    vis.select_mode(opts.mode);
    if opts.replay {
        vis.start_replay();
    }

    // a channel for sending input to the frame loop.
    let (tx, rx) = channel::bounded(1024);
    if let Some(addr) = opts.live.clone() {
        let tx = tx.clone();
        let status = status.clone();
        thread::spawn(move || read_live(&addr, &status, &tx));
    }
    {
        let tx = tx.clone();
        thread::spawn(move || {
            if let Err(e) = read_commands(&tx) {
                log::error!("command input failed: {}", e);
            }
        });
    }

    let frames = MonitorData::new(None);
    let renderer = {
        let frames = frames.clone();
        thread::spawn(move || {
            frames.on_changed(|frame: &Option<Frame>| {
                if let Some(frame) = frame {
                    render(frame);
                }
            })
        })
    };

    let ticker = channel::tick(config.frame_interval());
    let mut last = Instant::now();
    loop {
        channel::select! {
            recv(rx) -> msg => {
                // we hold a sender ourselves, so the channel can't disconnect.
                match msg? {
                    Msg::Live(line) => {
                        if let Err(e) = vis.on_live_message(&line) {
                            log::warn!("bad telemetry frame ({}): {}", e, line);
                        }
                    }
                    Msg::Insights(raw) => {
                        if let Err(e) = vis.on_insights_message(&raw) {
                            log::warn!("bad insights frame: {}", e);
                        }
                    }
                    Msg::Command(Command::Quit) => break,
                    Msg::Command(cmd) => apply(&mut vis, cmd),
                }
            }
            recv(ticker) -> now => {
                let now = now?;
                let frame = vis.frame(now.duration_since(last));
                last = now;
                frames.update(|latest| *latest = Some(frame));
            }
        }
    }
    frames.close();
    status.set_open(false);
    if renderer.join().is_err() {
        log::error!("render thread panicked");
    }
    Ok(())
}

fn apply(vis: &mut Visualizer, cmd: Command) {
    match cmd {
        Command::Mode(name) => {
            vis.select_mode_named(&name);
        }
        Command::ToggleReplay => {
            vis.toggle_replay();
        }
        Command::AddPerson => {
            vis.scene_mut().add_person();
        }
        Command::RemovePerson => {
            vis.scene_mut().remove_person();
        }
        Command::NextShape => {
            vis.scene_mut().next_shape();
        }
        Command::StandUp => {
            let height = vis.scene_mut().raise_stand();
            log::info!("stand height {}", height);
        }
        Command::StandDown => {
            let height = vis.scene_mut().lower_stand();
            log::info!("stand height {}", height);
        }
        Command::Status => {
            let spatial = vis.spatial();
            log::info!(
                "source {}, mode {}, replay {:?}, {} people, dominant {} ({} switches)",
                vis.source(),
                vis.active_mode(),
                vis.replay_state(),
                vis.scene().people(),
                spatial.dominant_side,
                spatial.speaker_switches
            );
        }
        Command::Quit => (),
    }
}

/// Stand-in for the sphere renderer: reports what would be drawn.
fn render(frame: &Frame) {
    log::trace!("{} {} {}", frame.source, frame.active_mode, frame.readout);
    for indicator in &frame.spatial_indicators {
        log::trace!(
            "{} indicator at scale {:.2}, {:.1} pulses/s",
            indicator.side,
            indicator.scale,
            indicator.pulse_speed
        );
    }
    if let Some(chart) = &frame.chart {
        match chart.layout() {
            ChartLayout::Stereo(points) => {
                log::debug!("stereo chart, {} points ({:?})", points.len(), chart.origin)
            }
            ChartLayout::Activity(bars) => {
                log::debug!("activity chart, {} bars ({:?})", bars.len(), chart.origin)
            }
        }
    }
}

/// Keep a connection to the sensor board open, forwarding each line. Reconnects when the board
/// drops off.
fn read_live(addr: &str, status: &LiveStatus, tx: &channel::Sender<Msg>) {
    loop {
        match TcpStream::connect(addr) {
            Ok(stream) => {
                log::info!("connected to sensor at {}", addr);
                status.set_open(true);
                for line in BufReader::new(stream).lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            log::warn!("sensor connection error: {}", e);
                            break;
                        }
                    };
                    if tx.send(Msg::Live(line)).is_err() {
                        // frame loop is gone
                        status.set_open(false);
                        return;
                    }
                }
                status.set_open(false);
                log::warn!("sensor at {} disconnected", addr);
            }
            Err(e) => log::warn!("could not connect to sensor at {}: {}", addr, e),
        }
        thread::sleep(RECONNECT_DELAY);
    }
}

/// Read commands from stdin, one per line. Lines starting with `{` are insights frames.
fn read_commands(tx: &channel::Sender<Msg>) -> Result {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let msg = if line.trim_start().starts_with('{') {
            Msg::Insights(line)
        } else {
            match Command::parse(&line) {
                Some(cmd) => Msg::Command(cmd),
                None => continue,
            }
        };
        if tx.send(msg).is_err() {
            break;
        }
    }
    log::debug!("command input closed");
    Ok(())
}

// boilerplate

/// Wrap the run method so we can pass it command line args, setup logging, and handle errors
/// gracefully.
fn main() {
    let opts = Opt::from_args();
    setup_logger(opts.verbosity);
    if let Err(err) = run(opts) {
        log::error!("{}", err);
        for e in err.chain().skip(1) {
            log::error!("caused by {}", e);
        }
    }
}

/// Make the logger match our verbosity. This is custom because we don't want to see all messages
/// from other packages, only `roomsphere`.
fn setup_logger(verbosity: u32) {
    use log::LevelFilter;
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    pretty_env_logger::formatted_timed_builder()
        .filter(None, LevelFilter::Warn)
        .filter(Some("roomsphere"), level)
        .init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("  "), None);
        assert_eq!(Command::parse("replay\n"), Some(Command::ToggleReplay));
        assert_eq!(Command::parse("+"), Some(Command::AddPerson));
        assert_eq!(
            Command::parse("stereo"),
            Some(Command::Mode("stereo".into()))
        );
        assert_eq!(Command::parse("q"), Some(Command::Quit));
    }
}
