//! End-to-end reconcile flow against the in-memory store: a first-run
//! backfill followed by an incremental cycle whose fetch window
//! re-covers (and must discard) the last committed day.

use gdb_client::domain::{DailyUsage, SeriesId};
use poller_service::reconcile::merge;
use poller_service::store::{memory::MemoryStore, read_tails, StatisticsStore};
use time::{macros::date, Date};

fn reading(date: Date, energy: f64, volume: f64, price: f64) -> DailyUsage {
    DailyUsage {
        date,
        energy_kwh: energy,
        volume_m3: volume,
        price_eur: price,
        ratio: 11.2,
        temperature: 9.0,
    }
}

#[tokio::test]
async fn first_run_then_incremental_cycle_appends_without_duplicates() {
    let store = MemoryStore::new();

    // First cycle: empty store, full historical window.
    let tails = read_tails(&store).await.unwrap();
    assert!(tails.boundary().is_none());

    let window = vec![
        reading(date!(2024 - 03 - 08), 6.0, 0.6, 0.9),
        reading(date!(2024 - 03 - 09), 4.0, 0.4, 0.6),
        reading(date!(2024 - 03 - 10), 5.0, 0.5, 0.7),
    ];
    let plan = merge(&tails, &window).unwrap();
    assert_eq!(plan.len(), 3);
    store.append_plan(&plan).await.unwrap();

    // Second cycle: the incremental window starts at the boundary day,
    // which the source republished with a revised value.
    let tails = read_tails(&store).await.unwrap();
    assert_eq!(tails.boundary(), Some(date!(2024 - 03 - 10)));
    assert_eq!(tails.energy.unwrap().sum, 15.0);

    let window = vec![
        reading(date!(2024 - 03 - 10), 5.5, 0.55, 0.8), // revised, must be dropped
        reading(date!(2024 - 03 - 11), 3.0, 0.3, 0.4),
        reading(date!(2024 - 03 - 12), 4.0, 0.4, 0.5),
    ];
    let plan = merge(&tails, &window).unwrap();
    assert_eq!(plan.len(), 2);
    store.append_plan(&plan).await.unwrap();

    // Five committed days per series, strictly increasing, sums chained
    // across the cycle boundary; the revision never entered the series.
    for id in SeriesId::ALL {
        let points = store.points(id);
        assert_eq!(points.len(), 5);
        for w in points.windows(2) {
            assert!(w[0].start < w[1].start);
            assert!((w[1].sum - (w[0].sum + w[1].value)).abs() < 1e-9);
        }
    }

    let energy = store.points(SeriesId::EnergyConsumption);
    assert_eq!(energy[2].value, 5.0); // committed first-run value, not 5.5
    assert_eq!(energy[4].sum, 15.0 + 3.0 + 4.0);

    let volume = store.points(SeriesId::Volume);
    assert!((volume[4].sum - 2.2).abs() < 1e-9);

    // A third cycle with nothing new past the boundary is a no-op.
    let tails = read_tails(&store).await.unwrap();
    assert_eq!(tails.boundary(), Some(date!(2024 - 03 - 12)));
    let plan = merge(&tails, &[reading(date!(2024 - 03 - 12), 4.0, 0.4, 0.5)]).unwrap();
    assert!(plan.is_empty());
}

#[tokio::test]
async fn tails_reflect_recovered_sums_not_raw_values() {
    let store = MemoryStore::new();

    let plan = merge(
        &read_tails(&store).await.unwrap(),
        &[
            reading(date!(2024 - 01 - 01), 10.0, 1.0, 1.5),
            reading(date!(2024 - 01 - 02), 7.0, 0.7, 1.0),
        ],
    )
    .unwrap();
    store.append_plan(&plan).await.unwrap();

    let tails = read_tails(&store).await.unwrap();
    let energy = tails.energy.unwrap();
    assert_eq!(energy.value, 7.0);
    assert_eq!(energy.sum, 17.0);
    let cost = tails.cost.unwrap();
    assert_eq!(cost.sum, 2.5);
}
