use std::fs;

use chrono::NaiveDate;
use homestay_core::calendar::{
    CalendarController, CarouselSettings, DayStatus, NavigationOutcome, interpret_swipe,
};
use homestay_core::catalog::RoomCatalog;
use homestay_core::config::Config;
use homestay_core::datetime::CalendarMonth;
use homestay_core::room::available_rooms;
use tempfile::tempdir;

const ROOMS: &str = r#"{
    "success": true,
    "source": "database",
    "count": 2,
    "data": [
        {
            "room_id": "0101",
            "name": "Garden",
            "price": 450000,
            "capacity": 2,
            "bookedIntervals": [
                {"checkIn": "2025-06-10", "checkOut": "2025-06-13", "guestName": "Lan"},
                {"checkIn": "2025-06-30", "checkOut": "2025-07-02"}
            ]
        },
        {
            "room_id": "0102",
            "name": "Loft",
            "price": 600000,
            "capacity": 4,
            "bookedIntervals": [{"checkIn": "2025-05-28", "checkOut": "2025-06-03"}]
        }
    ]
}"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn rooms_file_to_calendar_window() {
    let temp = tempdir().expect("tempdir");
    let rooms_path = temp.path().join("rooms.json");
    fs::write(&rooms_path, ROOMS).expect("write rooms");

    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, "[calendar]\nanimation_timeout_ms = 250\n").expect("write config");
    let cfg = Config::load(Some(&config_path)).expect("load config");

    let catalog = RoomCatalog::load(&rooms_path).expect("load rooms");
    assert_eq!(catalog.source(), Some("database"));

    let today = date(2025, 6, 1);
    let free: Vec<&str> = available_rooms(catalog.rooms(), today)
        .into_iter()
        .map(|room| room.id.as_str())
        .collect();
    assert_eq!(free, vec!["0101"]);

    let garden = catalog.require("0101").expect("garden present").clone();
    let mut controller = CalendarController::new(cfg.carousel_settings(), today);
    controller.open_for_room(garden, today);

    let [june, july] = controller.visible_months().expect("window built");
    assert_eq!(june.count(DayStatus::Today), 1);
    assert_eq!(june.count(DayStatus::Booked), 4);
    assert_eq!(july.count(DayStatus::Booked), 1);
    assert_eq!(july.count(DayStatus::Past), 0);

    let command = interpret_swipe(320.0, 180.0, cfg.swipe_threshold()).expect("long swipe");
    assert_eq!(
        controller.dispatch(command),
        NavigationOutcome::Accepted {
            anchor: CalendarMonth::new(2025, 6)
        }
    );
    assert_eq!(
        controller.dispatch(command),
        NavigationOutcome::IgnoredWhileAnimating
    );
    controller.on_animation_complete();

    let window = controller.render_window().expect("window built");
    let labels: Vec<&str> = window.iter().map(|view| view.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["June 2025", "July 2025", "August 2025", "September 2025"]
    );
    assert_eq!(window[0].count(DayStatus::Booked), 4);
}

#[test]
fn missing_rooms_file_is_an_error() {
    let temp = tempdir().expect("tempdir");
    let err = RoomCatalog::load(&temp.path().join("absent.json")).expect_err("missing file");
    assert!(format!("{err:#}").contains("absent.json"));

    let controller = CalendarController::new(CarouselSettings::default(), date(2025, 6, 1));
    assert!(controller.visible_months().is_none());
}
