//! Offline probe: reads recorded frame messages (one JSON object per line)
//! from a file or stdin and prints what the viewer would do with each.
//!
//! ```text
//! hand_probe capture.jsonl
//! hand_probe < capture.jsonl
//! ```

use hand_core::{classify, decode, distance, render, to_screen, RecordingSurface, SkeletonStyle};
use std::fs::File;
use std::io::{self, BufRead, BufReader};

const SCREEN: (u32, u32) = (1920, 1080);

fn main() {
    let input: Box<dyn BufRead> = match std::env::args().nth(1) {
        Some(path) => match File::open(&path) {
            Ok(f)  => Box::new(BufReader::new(f)),
            Err(e) => {
                eprintln!("  ⚠  cannot open {path}: {e}");
                std::process::exit(1);
            }
        },
        None => Box::new(BufReader::new(io::stdin())),
    };

    println!();
    println!("  ┌─ hand_probe ─");

    let mut frames = 0usize;
    let mut bad    = 0usize;

    for (n, line) in input.lines().enumerate() {
        let line = match line {
            Ok(l)  => l,
            Err(e) => { eprintln!("  ⚠  read error: {e}"); break; }
        };
        if line.trim().is_empty() {
            continue;
        }
        frames += 1;

        let frame = match decode(&line) {
            Ok(f)  => f,
            Err(e) => {
                bad += 1;
                println!("  │  #{n:<5} dropped: {e}");
                continue;
            }
        };

        let video = if frame.image.is_some() { "video" } else { "-----" };
        print!("  │  #{n:<5} {video}  hands={}", frame.hand_count());

        match frame.first_hand() {
            None => {}
            Some(Err(e)) => print!("  rejected: {e}"),
            Some(Ok(hand)) => {
                let mut surface = RecordingSurface::new(640, 480);
                render(&mut surface, hand.landmarks().points(), &SkeletonStyle::default());

                let pinch   = distance(hand.index_finger(), hand.thumb());
                let gesture = classify(hand);
                let cursor  = to_screen(hand.index_finger(), SCREEN.0, SCREEN.1);
                match (pinch, gesture, cursor) {
                    (Ok(p), Ok(g), Ok(c)) => print!(
                        "  {g:<6}  pinch={p:.3}  cursor=({}, {})  draw_calls={}",
                        c.x, c.y, surface.calls.len(),
                    ),
                    _ => print!("  non-finite tip"),
                }
            }
        }
        println!();
    }

    println!("  └─ ({frames} frames, {bad} dropped)");
    println!();
}
