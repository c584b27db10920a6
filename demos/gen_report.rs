//! Generate report output for validation testing

fn main() {
    let json = r#"[
        { "participant": "Participant 1", "AOI": "Screen", "Start time": 0.00, "End time": 0.42 },
        { "participant": "Participant 1", "AOI": "Screen", "Start time": 0.48, "End time": 0.90 },
        { "participant": "Participant 1", "AOI": "Knob", "Start time": 0.95, "End time": 1.30 },
        { "participant": "Participant 1", "AOI": "Screen", "Start time": 1.36, "End time": 1.80 },
        { "participant": "Participant 1", "AOI": "Alarm", "Start time": 1.85, "End time": 2.10 },
        { "participant": "Participant 2", "AOI": "Knob", "Start time": 0.00, "End time": 0.30 },
        { "participant": "Participant 2", "AOI": "Screen", "Start time": 0.35, "End time": 0.95 },
        { "participant": "Participant 2", "AOI": "Knob", "Start time": 1.00, "End time": 1.20 },
        { "participant": "Participant 2", "AOI": "Knob", "Start time": 1.25, "End time": 1.60 }
    ]"#;

    match gaze_flux::fixations_to_report(json, &gaze_flux::ReportConfig::default()) {
        Ok(report) => print!("{report}"),
        Err(e) => eprintln!("Error: {e:?}"),
    }
}
