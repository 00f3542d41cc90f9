use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use ircseen::seen::humanize_elapsed;
use ircseen::state::{MembershipChange, PresenceTracker};

// Roster maintenance is on the hot path for every membership event, so
// measure it in isolation from storage.

fn roster_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("presence");
    let nicks: Vec<String> = (0..500).map(|i| format!("user{i}")).collect();
    group.throughput(Throughput::Elements(nicks.len() as u64));

    group.bench_function("names_burst", |b| {
        b.iter(|| {
            let mut presence = PresenceTracker::new();
            presence.set_own_nick("net", "bot");
            presence.apply(
                "net",
                "bot",
                &MembershipChange::Join {
                    channel: "#chan".to_string(),
                },
            );
            presence.apply_names("net", "#chan", &nicks);
            presence
        })
    });

    group.bench_function("nick_change_across_channels", |b| {
        let mut presence = PresenceTracker::new();
        presence.set_own_nick("net", "bot");
        for i in 0..50 {
            let channel = format!("#chan{i}");
            presence.apply("net", "bot", &MembershipChange::Join { channel: channel.clone() });
            presence.apply_names("net", &channel, &nicks);
        }
        let forward = MembershipChange::NickChange {
            new_nick: "user0_away".to_string(),
        };
        let back = MembershipChange::NickChange {
            new_nick: "user0".to_string(),
        };

        b.iter(|| {
            presence.apply("net", "user0", &forward);
            presence.apply("net", "user0_away", &back)
        })
    });

    group.finish();
}

fn humanize_benchmark(c: &mut Criterion) {
    c.bench_function("humanize_elapsed", |b| {
        b.iter(|| humanize_elapsed(std::hint::black_box(3 * 86_400 + 7_200)))
    });
}

criterion_group!(benches, roster_benchmark, humanize_benchmark);
criterion_main!(benches);
