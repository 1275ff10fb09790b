use crate::{drive, Activity, ChannelStore, Half, Round, CHANNELS};

use core::convert::Infallible;
use embedded_hal::digital::v2::OutputPin;

/// The two compare channels of the frame timer.
pub trait Comparator {
    // Load compare values for the round after the current one. They must
    // not take effect before the next overflow, i.e. preloaded registers.
    fn arm(&mut self, first: u8, second: u8);
}

// Two-stage pipeline. `active` is the round being output during this timer
// period, `armed` the round whose compare values are loaded for the next one.
// Always `armed == active.next()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Pipeline {
    active: Round,
    armed: Round,
    // Values handed to the comparator for `armed`. Pins are raised from
    // these, not from the store, so a pin and its compare always agree.
    loaded: [u8; 2],
    // Pins of the active round that went high and still await their compare.
    raised: [bool; 2],
}

const fn slot(half: Half) -> usize {
    match half {
        Half::First => 0,
        Half::Second => 1,
    }
}

/// Pulse generator for all channels, run from the frame timer interrupt.
///
/// Every handler does a fixed amount of work: at most four pin writes, two
/// compare register writes and one activity tick.
pub struct Engine<'a, P, L, C> {
    channels: &'a ChannelStore,
    activity: &'a Activity<L>,
    pins: [P; CHANNELS],
    comparator: C,
    pipeline: Pipeline,
}

impl<'a, P, L, C> Engine<'a, P, L, C>
where
    P: OutputPin<Error = Infallible>,
    L: OutputPin<Error = Infallible>,
    C: Comparator,
{
    pub fn new(
        channels: &'a ChannelStore,
        activity: &'a Activity<L>,
        mut pins: [P; CHANNELS],
        mut comparator: C,
    ) -> Self {
        for pin in pins.iter_mut() {
            drive(pin, false);
        }

        let armed = Round::FIRST;
        let loaded = [
            channels.get(armed.channel(Half::First)),
            channels.get(armed.channel(Half::Second)),
        ];
        comparator.arm(loaded[0], loaded[1]);

        Engine {
            channels,
            activity,
            pins,
            comparator,
            pipeline: Pipeline {
                active: Round::LAST,
                armed,
                loaded,
                raised: [false; 2],
            },
        }
    }

    pub fn free(self) -> ([P; CHANNELS], C) {
        (self.pins, self.comparator)
    }

    pub fn comparator(&mut self) -> &mut C {
        &mut self.comparator
    }

    /// Round whose compare values are loaded for the coming period.
    pub fn cursor(&self) -> Round {
        self.pipeline.armed
    }

    /// Round being output in the current period.
    pub fn active(&self) -> Round {
        self.pipeline.active
    }

    /// Timer overflow, start of the next round.
    pub fn on_overflow(&mut self) {
        // Pulses longer than the period end here instead of running into the next round.
        self.lower(Half::First);
        self.lower(Half::Second);

        self.pipeline.active = self.pipeline.armed;
        self.raise(Half::First);
        self.raise(Half::Second);

        let armed = self.pipeline.active.next();
        let first = self.channels.get(armed.channel(Half::First));
        let second = self.channels.get(armed.channel(Half::Second));
        self.comparator.arm(first, second);
        self.pipeline.armed = armed;
        self.pipeline.loaded = [first, second];

        self.activity.tick();
    }

    /// Compare match for one pin of the active round.
    pub fn on_compare(&mut self, half: Half) {
        self.lower(half);
    }

    fn raise(&mut self, half: Half) {
        let channel = self.pipeline.active.channel(half);
        // Zero means off, not a zero-width pulse.
        let high = self.pipeline.loaded[slot(half)] != 0;
        if high {
            drive(&mut self.pins[channel.index()], true);
        }
        self.pipeline.raised[slot(half)] = high;
    }

    fn lower(&mut self, half: Half) {
        if core::mem::take(&mut self.pipeline.raised[slot(half)]) {
            let channel = self.pipeline.active.channel(half);
            drive(&mut self.pins[channel.index()], false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Channel, ROUNDS};
    use quickcheck::quickcheck;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    const PERIOD: u32 = 256;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Edge {
        tick: u32,
        high: bool,
    }

    #[derive(Default)]
    struct Scope {
        now: u32,
        edges: [Vec<Edge>; CHANNELS],
    }

    struct TestPin {
        channel: usize,
        scope: Rc<RefCell<Scope>>,
    }

    impl TestPin {
        fn record(&self, high: bool) {
            let mut scope = self.scope.borrow_mut();
            let tick = scope.now;
            scope.edges[self.channel].push(Edge { tick, high });
        }
    }

    impl OutputPin for TestPin {
        type Error = Infallible;

        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.record(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.record(true);
            Ok(())
        }
    }

    struct TestComparator(Rc<Cell<Option<(u8, u8)>>>);

    impl Comparator for TestComparator {
        fn arm(&mut self, first: u8, second: u8) {
            self.0.set(Some((first, second)));
        }
    }

    // Drives the engine like the timer does: overflow, then compare matches in tick order.
    struct Bench<'a> {
        engine: Engine<'a, TestPin, TestPin, TestComparator>,
        scope: Rc<RefCell<Scope>>,
        armed: Rc<Cell<Option<(u8, u8)>>>,
        period: u32,
    }

    impl<'a> Bench<'a> {
        fn new(channels: &'a ChannelStore, activity: &'a Activity<TestPin>, period: u32) -> Self {
            let scope = Rc::new(RefCell::new(Scope::default()));
            let armed = Rc::new(Cell::new(None));
            let pins = core::array::from_fn(|channel| TestPin {
                channel,
                scope: scope.clone(),
            });
            let engine = Engine::new(channels, activity, pins, TestComparator(armed.clone()));

            // Forget the initial low writes.
            for edges in scope.borrow_mut().edges.iter_mut() {
                edges.clear();
            }

            Bench {
                engine,
                scope,
                armed,
                period,
            }
        }

        fn run_round(&mut self) {
            let start = self.scope.borrow().now;
            // Preloaded values switch over at the update event.
            let (first, second) = self.armed.get().unwrap();
            self.engine.on_overflow();

            for tick in 0..self.period {
                self.scope.borrow_mut().now = start + tick;
                if u32::from(first) == tick {
                    self.engine.on_compare(Half::First);
                }
                if u32::from(second) == tick {
                    self.engine.on_compare(Half::Second);
                }
            }
            self.scope.borrow_mut().now = start + self.period;
        }

        fn run_frames(&mut self, frames: usize) {
            for _ in 0..frames * ROUNDS {
                self.run_round();
            }
        }

        fn edges(&self, channel: usize) -> Vec<Edge> {
            self.scope.borrow().edges[channel].clone()
        }
    }

    fn store(values: [u8; CHANNELS]) -> ChannelStore {
        let store = ChannelStore::new();
        for channel in Channel::all() {
            store.set(channel, values[channel.index()]);
        }
        store
    }

    fn pulse(start: u32, width: u32) -> [Edge; 2] {
        [
            Edge {
                tick: start,
                high: true,
            },
            Edge {
                tick: start + width,
                high: false,
            },
        ]
    }

    #[test]
    fn test_round_robin() {
        let channels = ChannelStore::new();
        let activity = Activity::new();
        let mut bench = Bench::new(&channels, &activity, PERIOD);

        // Any five consecutive rounds, whatever the starting point.
        for skip in 0..ROUNDS {
            for _ in 0..skip {
                bench.engine.on_overflow();
            }

            let mut visited = [0; ROUNDS];
            let mut previous = bench.engine.active();
            for _ in 0..ROUNDS {
                bench.engine.on_overflow();
                let active = bench.engine.active();
                assert_eq!(active, previous.next());
                assert_eq!(bench.engine.cursor(), active.next());
                visited[active.index()] += 1;
                previous = active;
            }
            assert_eq!(visited, [1; ROUNDS]);
        }
    }

    #[test]
    fn test_compare_armed_one_round_ahead() {
        let channels = store([1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let activity = Activity::new();
        let bench = Bench::new(&channels, &activity, PERIOD);
        let mut engine = bench.engine;

        assert_eq!(bench.armed.get(), Some((1, 6)));

        for expected in [(2, 7), (3, 8), (4, 9), (5, 10), (1, 6), (2, 7)] {
            engine.on_overflow();
            assert_eq!(bench.armed.get(), Some(expected));
        }
    }

    #[test]
    fn test_pulse_widths() {
        let values = [30, 160, 0, 90, 45, 30, 160, 0, 90, 45];
        let channels = store(values);
        let activity = Activity::new();
        let mut bench = Bench::new(&channels, &activity, PERIOD);

        bench.run_frames(2);

        let frame = ROUNDS as u32 * PERIOD;
        for channel in Channel::all() {
            let value = u32::from(values[channel.index()]);
            let round = (channel.index() % ROUNDS) as u32;
            let edges = bench.edges(channel.index());

            if value == 0 {
                assert!(edges.is_empty(), "channel {:?} pulsed", channel);
                continue;
            }

            let start = round * PERIOD;
            let mut expected = pulse(start, value).to_vec();
            expected.extend(pulse(start + frame, value));
            assert_eq!(edges, expected, "channel {:?}", channel);
        }
    }

    #[test]
    fn test_all_off() {
        let channels = ChannelStore::new();
        let activity = Activity::new();
        let mut bench = Bench::new(&channels, &activity, PERIOD);

        bench.run_frames(3);

        for channel in 0..CHANNELS {
            assert!(bench.edges(channel).is_empty());
        }
    }

    #[test]
    fn test_full_scale_value() {
        let mut values = [0; CHANNELS];
        values[4] = 255;
        let channels = store(values);
        let activity = Activity::new();
        let mut bench = Bench::new(&channels, &activity, PERIOD);

        bench.run_frames(1);

        assert_eq!(bench.edges(4), pulse(4 * PERIOD, 255));
    }

    #[test]
    fn test_long_pulse_cut_at_end_of_round() {
        // Timer period shorter than the largest value: 250 never matches.
        let period = 200;
        let mut values = [0; CHANNELS];
        values[1] = 250;
        values[2] = 40;
        let channels = store(values);
        let activity = Activity::new();
        let mut bench = Bench::new(&channels, &activity, period);

        bench.run_frames(1);

        assert_eq!(bench.edges(1), pulse(period, period));
        assert_eq!(bench.edges(2), pulse(2 * period, 40));
    }

    #[test]
    fn test_new_value_used_from_next_round() {
        let channels = ChannelStore::new();
        let activity = Activity::new();
        let mut bench = Bench::new(&channels, &activity, PERIOD);

        bench.run_frames(1);
        // Round 0 is already armed with the old value at this point.
        channels.set(Channel::new(3).unwrap(), 100);
        channels.set(Channel::new(0).unwrap(), 50);
        bench.run_frames(2);

        let frame = ROUNDS as u32 * PERIOD;
        assert_eq!(
            bench.edges(3),
            [pulse(frame + 3 * PERIOD, 100), pulse(2 * frame + 3 * PERIOD, 100)].concat()
        );
        assert_eq!(bench.edges(0), pulse(2 * frame, 50));
    }

    #[test]
    fn test_switch_off_mid_frame() {
        let channels = store([80; CHANNELS]);
        let activity = Activity::new();
        let mut bench = Bench::new(&channels, &activity, PERIOD);

        bench.run_frames(1);
        channels.set(Channel::new(6).unwrap(), 0);
        bench.run_frames(2);

        // One pulse from the first frame and none after.
        assert_eq!(bench.edges(6), pulse(PERIOD, 80));
    }

    #[test]
    fn test_activity_ticks_once_per_overflow() {
        let channels = ChannelStore::new();
        let activity = Activity::new();
        let mut bench = Bench::new(&channels, &activity, PERIOD);

        activity.trigger(20);
        for _ in 0..19 {
            bench.run_round();
        }
        assert!(activity.is_on());
        bench.run_round();
        assert!(!activity.is_on());
    }

    #[test]
    fn test_free() {
        let channels = ChannelStore::new();
        let activity = Activity::new();
        let bench = Bench::new(&channels, &activity, PERIOD);

        let (pins, _) = bench.engine.free();
        let order: Vec<usize> = pins.iter().map(|pin| pin.channel).collect();
        assert_eq!(order, (0..CHANNELS).collect::<Vec<_>>());
    }

    quickcheck! {
        fn prop_one_pulse_of_value_width(channel: usize, value: u8, others: Vec<u8>) -> bool {
            let channel = channel % CHANNELS;
            let mut values = [0; CHANNELS];
            for (slot, other) in values.iter_mut().zip(others) {
                *slot = other;
            }
            values[channel] = value;

            let channels = store(values);
            let activity = Activity::new();
            let mut bench = Bench::new(&channels, &activity, PERIOD);
            bench.run_frames(1);

            let start = (channel % ROUNDS) as u32 * PERIOD;
            let edges = bench.edges(channel);
            if value == 0 {
                edges.is_empty()
            } else {
                edges == pulse(start, u32::from(value))
            }
        }
    }
}
