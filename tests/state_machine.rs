//! Behavioral tests for configuration, resolution and transition ordering.

mod common;

use common::{Log, State, Trigger};
use parking_lot::Mutex;
use statehouse::{
    args, Args, ConfigurationError, FiringMode, MachineError, ParameterError, Permission,
    ResolutionError, StateMachine, Transition,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn arg_is(expected: i32) -> impl Fn(&Args) -> bool + Send + Sync + 'static {
    move |args: &Args| args.get::<i32>(0) == Some(&expected)
}

#[test]
fn initial_transition_notifications_are_ordered() {
    let log = Log::default();
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit(Trigger::X, State::B)
        .unwrap()
        .on_exit(log.on("ExitA"));
    machine
        .configure(State::B)
        .initial_transition(State::C)
        .unwrap()
        .on_entry(log.on("EnterB"));
    machine
        .configure(State::C)
        .substate_of(State::B)
        .unwrap()
        .on_entry(log.on("EnterC"));
    machine.on_transitioned(log.hops());
    let completed = log.clone();
    machine.on_transition_completed(move |t: &Transition<State, Trigger>| {
        completed.push(format!("Completed {:?}->{:?}", t.source(), t.destination()))
    });

    machine.fire(Trigger::X).unwrap();

    assert_eq!(machine.state(), State::C);
    assert_eq!(
        log.entries(),
        vec!["ExitA", "A->B", "EnterB", "B->C", "EnterC", "Completed A->C"]
    );
}

#[test]
fn initial_hops_are_marked_initial() {
    let initial_flags = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&initial_flags);
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit(Trigger::X, State::B)
        .unwrap();
    machine
        .configure(State::B)
        .initial_transition(State::C)
        .unwrap();
    machine
        .configure(State::C)
        .substate_of(State::B)
        .unwrap();
    machine.on_transitioned(move |t: &Transition<State, Trigger>| sink.lock().push(t.is_initial()));

    machine.fire(Trigger::X).unwrap();

    assert_eq!(*initial_flags.lock(), vec![false, true]);
}

#[test]
fn nested_initial_transitions_enter_each_state_once() {
    let log = Log::default();
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit(Trigger::X, State::B)
        .unwrap();
    machine
        .configure(State::B)
        .initial_transition(State::C)
        .unwrap()
        .on_entry(log.on("B"));
    machine
        .configure(State::C)
        .substate_of(State::B)
        .unwrap()
        .initial_transition(State::D)
        .unwrap()
        .on_entry(log.on("C"));
    machine
        .configure(State::D)
        .substate_of(State::C)
        .unwrap()
        .on_entry(log.on("D"));

    machine.fire(Trigger::X).unwrap();

    assert_eq!(machine.state(), State::D);
    assert_eq!(log.entries(), vec!["B", "C", "D"]);
}

#[test]
fn initial_transition_to_non_descendant_fails_before_side_effects() {
    let log = Log::default();
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit(Trigger::X, State::B)
        .unwrap()
        .on_exit(log.on("ExitA"));
    machine
        .configure(State::B)
        .initial_transition(State::C)
        .unwrap();

    let result = machine.fire(Trigger::X);

    assert!(matches!(
        result,
        Err(MachineError::Configuration(
            ConfigurationError::InitialTransitionNotDescendant { .. }
        ))
    ));
    assert_eq!(machine.state(), State::A);
    assert!(log.entries().is_empty());
}

#[test]
fn superstate_is_not_exited_between_its_substates() {
    let log = Log::default();
    let machine = StateMachine::new(State::B);
    machine
        .configure(State::A)
        .on_entry(log.on("EnterA"))
        .on_exit(log.on("ExitA"));
    machine
        .configure(State::B)
        .substate_of(State::A)
        .unwrap()
        .permit(Trigger::X, State::C)
        .unwrap()
        .on_exit(log.on("ExitB"));
    machine
        .configure(State::C)
        .substate_of(State::A)
        .unwrap()
        .on_entry(log.on("EnterC"));

    machine.fire(Trigger::X).unwrap();

    assert_eq!(machine.state(), State::C);
    assert_eq!(log.entries(), vec!["ExitB", "EnterC"]);
}

#[test]
fn transition_to_superstate_does_not_exit_it() {
    let log = Log::default();
    let machine = StateMachine::new(State::B);
    machine
        .configure(State::A)
        .on_entry(log.on("EnterA"))
        .on_exit(log.on("ExitA"));
    machine
        .configure(State::B)
        .substate_of(State::A)
        .unwrap()
        .permit(Trigger::X, State::A)
        .unwrap()
        .on_exit(log.on("ExitB"));

    machine.fire(Trigger::X).unwrap();

    assert_eq!(machine.state(), State::A);
    assert_eq!(log.entries(), vec!["ExitB"]);
}

#[test]
fn leaving_a_hierarchy_exits_inner_to_outer_and_enters_outer_to_inner() {
    let log = Log::default();
    let machine = StateMachine::new(State::B);
    machine.configure(State::A).on_exit(log.on("ExitA"));
    machine
        .configure(State::B)
        .substate_of(State::A)
        .unwrap()
        .permit(Trigger::X, State::D)
        .unwrap()
        .on_exit(log.on("ExitB"));
    machine.configure(State::C).on_entry(log.on("EnterC"));
    machine
        .configure(State::D)
        .substate_of(State::C)
        .unwrap()
        .on_entry(log.on("EnterD"));

    machine.fire(Trigger::X).unwrap();

    assert_eq!(log.entries(), vec!["ExitB", "ExitA", "EnterC", "EnterD"]);
}

#[test]
fn reentry_exits_and_enters_once() {
    let entries = Arc::new(AtomicUsize::new(0));
    let exits = Arc::new(AtomicUsize::new(0));
    let (entry_count, exit_count) = (Arc::clone(&entries), Arc::clone(&exits));
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit_reentry(Trigger::X)
        .on_entry(move |_| {
            entry_count.fetch_add(1, Ordering::SeqCst);
        })
        .on_exit(move |_| {
            exit_count.fetch_add(1, Ordering::SeqCst);
        });

    machine.fire(Trigger::X).unwrap();

    assert_eq!(machine.state(), State::A);
    assert_eq!(entries.load(Ordering::SeqCst), 1);
    assert_eq!(exits.load(Ordering::SeqCst), 1);
}

#[test]
fn reentry_transition_is_reported_as_reentry() {
    let flags = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&flags);
    let machine = StateMachine::new(State::A);
    machine.configure(State::A).permit_reentry(Trigger::X);
    machine.on_transitioned(move |t: &Transition<State, Trigger>| sink.lock().push(t.is_reentry()));

    machine.fire(Trigger::X).unwrap();

    assert_eq!(*flags.lock(), vec![true]);
}

#[test]
fn reentry_on_superstate_from_substate() {
    let log = Log::default();
    let machine = StateMachine::new(State::B);
    machine
        .configure(State::A)
        .permit_reentry(Trigger::X)
        .initial_transition(State::B)
        .unwrap()
        .on_entry(log.on("EnterA"))
        .on_exit(log.on("ExitA"));
    machine
        .configure(State::B)
        .substate_of(State::A)
        .unwrap()
        .on_entry(log.on("EnterB"))
        .on_exit(log.on("ExitB"));

    machine.fire(Trigger::X).unwrap();

    assert_eq!(machine.state(), State::B);
    assert_eq!(log.entries(), vec!["ExitB", "ExitA", "EnterA", "EnterB"]);
}

#[test]
fn guards_escalate_to_superstate() {
    let build = || {
        let machine = StateMachine::new(State::B);
        machine
            .configure(State::A)
            .permit_if(Trigger::X, State::D, arg_is(3))
            .unwrap();
        machine
            .configure(State::B)
            .substate_of(State::A)
            .unwrap()
            .permit_if(Trigger::X, State::C, arg_is(2))
            .unwrap();
        machine
    };

    let escalated = build();
    escalated.fire_with(Trigger::X, args![3_i32]).unwrap();
    assert_eq!(escalated.state(), State::D);

    let local = build();
    local.fire_with(Trigger::X, args![2_i32]).unwrap();
    assert_eq!(local.state(), State::C);
}

#[test]
fn guards_unmet_carries_descriptions() {
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit_if(Trigger::X, State::B, statehouse::Guard::described("door closed", |_| false))
        .unwrap();

    let result = machine.fire(Trigger::X);

    assert_eq!(
        result,
        Err(MachineError::Resolution(ResolutionError::GuardsUnmet {
            state: "A".to_string(),
            trigger: "X".to_string(),
            guards: vec!["door closed".to_string()],
        }))
    );
    assert_eq!(
        result.err().map(|e| e.to_string()).as_deref(),
        Some("Trigger 'X' is valid for transition from state 'A' but a guard conditions are not met. Guard descriptions: 'door closed'.")
    );
}

#[test]
fn overlapping_guards_are_ambiguous_even_with_unhandled_handler() {
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit_if(Trigger::X, State::B, |_: &Args| true)
        .unwrap()
        .permit_if(Trigger::X, State::C, |_: &Args| true)
        .unwrap();
    machine.on_unhandled_trigger(|_: &State, _: &Trigger, _: &[String]| {});

    let result = machine.fire(Trigger::X);

    assert!(matches!(
        result,
        Err(MachineError::Resolution(ResolutionError::Ambiguous { .. }))
    ));
    assert_eq!(machine.check_trigger(&Trigger::X, ()), Permission::Ambiguous);
    assert_eq!(machine.state(), State::A);
}

#[test]
fn unconfigured_trigger_is_not_permitted() {
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit(Trigger::X, State::B)
        .unwrap();

    let result = machine.fire(Trigger::Z);

    assert_eq!(
        result.err().map(|e| e.to_string()).as_deref(),
        Some("No valid leaving transitions are permitted from state 'A' for trigger 'Z'. Consider ignoring the trigger.")
    );
}

#[test]
fn unhandled_trigger_handler_receives_state_and_unmet_guards() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit_if(Trigger::X, State::B, statehouse::Guard::described("never", |_| false))
        .unwrap();
    machine.on_unhandled_trigger(move |state: &State, trigger: &Trigger, unmet: &[String]| {
        sink.lock().push((*state, *trigger, unmet.to_vec()));
    });

    machine.fire(Trigger::Z).unwrap();
    machine.fire(Trigger::X).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            (State::A, Trigger::Z, Vec::new()),
            (State::A, Trigger::X, vec!["never".to_string()]),
        ]
    );
    assert_eq!(machine.state(), State::A);
}

#[test]
fn ignored_trigger_in_substate_shadows_superstate_permit() {
    let machine = StateMachine::new(State::B);
    machine
        .configure(State::A)
        .permit(Trigger::X, State::C)
        .unwrap();
    machine
        .configure(State::B)
        .substate_of(State::A)
        .unwrap()
        .ignore(Trigger::X);

    machine.fire(Trigger::X).unwrap();

    assert_eq!(machine.state(), State::B);
    assert!(machine.permitted_triggers().contains(&Trigger::X));
}

#[test]
fn internal_transition_runs_once_without_exit_or_entry() {
    let log = Log::default();
    let machine = StateMachine::new(State::B);
    machine
        .configure(State::A)
        .internal_transition(Trigger::X, log.on("InternalA"));
    machine
        .configure(State::B)
        .substate_of(State::A)
        .unwrap()
        .internal_transition(Trigger::X, log.on("InternalB"))
        .on_entry(log.on("EnterB"))
        .on_exit(log.on("ExitB"));
    machine.on_transitioned(log.hops());

    machine.fire(Trigger::X).unwrap();

    assert_eq!(machine.state(), State::B);
    assert_eq!(log.entries(), vec!["InternalB"]);
}

#[test]
fn internal_transition_sees_trigger_arguments() {
    let received = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&received);
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .internal_transition(Trigger::X, move |t: &Transition<State, Trigger>| {
            *sink.lock() = t.args().get::<String>(0).cloned();
        });

    machine
        .fire_with(Trigger::X, args!["payload".to_string()])
        .unwrap();

    assert_eq!(received.lock().as_deref(), Some("payload"));
}

#[test]
fn dynamic_transition_selects_destination_from_arguments() {
    let machine = StateMachine::new(State::A);
    machine.configure(State::A).permit_dynamic(Trigger::X, |args| {
        if args.get::<i32>(0) == Some(&1) {
            State::B
        } else {
            State::C
        }
    });

    machine.fire_with(Trigger::X, (1_i32,)).unwrap();
    assert_eq!(machine.state(), State::B);
}

#[test]
fn dynamic_transition_to_current_state_is_reentry() {
    let log = Log::default();
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit_dynamic(Trigger::X, |_| State::A)
        .on_entry(log.on("EnterA"))
        .on_exit(log.on("ExitA"));

    machine.fire(Trigger::X).unwrap();

    assert_eq!(log.entries(), vec!["ExitA", "EnterA"]);
}

#[test]
fn entry_from_trigger_only_runs_for_that_trigger() {
    let log = Log::default();
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit(Trigger::X, State::B)
        .unwrap()
        .permit(Trigger::Y, State::B)
        .unwrap();
    machine
        .configure(State::B)
        .permit(Trigger::Z, State::A)
        .unwrap()
        .on_entry_from(Trigger::X, log.on("FromX"))
        .on_entry(log.on("Always"));

    machine.fire(Trigger::Y).unwrap();
    machine.fire(Trigger::Z).unwrap();
    machine.fire(Trigger::X).unwrap();

    assert_eq!(log.entries(), vec!["Always", "FromX", "Always"]);
}

#[test]
fn guard_runs_once_per_fire_and_never_for_info() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit_if(Trigger::X, State::B, move |_: &Args| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap();

    let before = machine.info();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert!(machine.can_fire(&Trigger::X));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(machine.info(), before);

    machine.fire(Trigger::X).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn permitted_triggers_union_across_hierarchy() {
    let machine = StateMachine::new(State::B);
    machine
        .configure(State::A)
        .permit(Trigger::X, State::C)
        .unwrap()
        .permit_if(Trigger::Z, State::C, |_: &Args| false)
        .unwrap();
    machine
        .configure(State::B)
        .substate_of(State::A)
        .unwrap()
        .permit(Trigger::Y, State::D)
        .unwrap()
        .permit(Trigger::X, State::D)
        .unwrap();

    assert_eq!(machine.permitted_triggers(), vec![Trigger::Y, Trigger::X]);
    assert!(!machine.can_fire(&Trigger::Z));
    assert_eq!(
        machine.check_trigger(&Trigger::Z, ()),
        Permission::GuardsUnmet(vec!["Function".to_string()])
    );
}

#[test]
fn permitted_triggers_respect_arguments() {
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit_if(Trigger::X, State::B, arg_is(7))
        .unwrap();

    assert!(machine.permitted_triggers().is_empty());
    assert_eq!(machine.permitted_triggers_with((7_i32,)), vec![Trigger::X]);
    assert!(machine.can_fire_with(&Trigger::X, args![7_i32]));
}

#[test]
fn trigger_parameters_are_validated() {
    let machine = StateMachine::new(State::A);
    let assign = machine
        .set_trigger_parameters::<(i32,)>(Trigger::X)
        .unwrap();
    machine
        .configure(State::A)
        .permit_if(Trigger::X, State::B, arg_is(5))
        .unwrap();

    assert!(matches!(
        machine.fire_with(Trigger::X, args!["five"]),
        Err(MachineError::Parameters(ParameterError::WrongType { position: 0, .. }))
    ));
    assert!(matches!(
        machine.fire_with(Trigger::X, args![5_i32, 6_i32]),
        Err(MachineError::Parameters(ParameterError::TooMany {
            expected: 1,
            actual: 2
        }))
    ));
    assert!(matches!(
        machine.fire(Trigger::X),
        Err(MachineError::Parameters(ParameterError::Missing { position: 0, .. }))
    ));
    assert_eq!(machine.state(), State::A);

    machine.fire_params(&assign, (5,)).unwrap();
    assert_eq!(machine.state(), State::B);
}

#[test]
fn trigger_parameters_configured_once() {
    let machine = StateMachine::<State, Trigger>::new(State::A);
    machine
        .set_trigger_parameters::<(String,)>(Trigger::X)
        .unwrap();

    let again = machine.set_trigger_parameters::<(i32,)>(Trigger::X);

    assert_eq!(
        again.err(),
        Some(ConfigurationError::ParametersAlreadyConfigured {
            trigger: "X".to_string()
        })
    );
}

#[test]
fn activation_runs_outer_to_inner_once() {
    let log = Log::default();
    let machine = StateMachine::new(State::B);
    machine
        .configure(State::A)
        .on_activate(log.lifecycle("ActivateA"))
        .on_deactivate(log.lifecycle("DeactivateA"));
    machine
        .configure(State::B)
        .substate_of(State::A)
        .unwrap()
        .on_activate(log.lifecycle("ActivateB"))
        .on_deactivate(log.lifecycle("DeactivateB"));
    machine.on_transitioned(log.hops());

    machine.activate().unwrap();
    machine.activate().unwrap();
    assert!(machine.is_activated());

    machine.deactivate().unwrap();
    machine.deactivate().unwrap();
    assert!(!machine.is_activated());

    assert_eq!(
        log.entries(),
        vec!["ActivateA", "ActivateB", "DeactivateB", "DeactivateA"]
    );
}

#[test]
fn external_state_mutator_called_once_per_fire() {
    let stored = Arc::new(Mutex::new(State::A));
    let writes = Arc::new(AtomicUsize::new(0));
    let (read, write, count) = (Arc::clone(&stored), Arc::clone(&stored), Arc::clone(&writes));
    let machine = StateMachine::with_external_state(
        move || *read.lock(),
        move |state| {
            count.fetch_add(1, Ordering::SeqCst);
            *write.lock() = state;
        },
        FiringMode::Queued,
    );
    machine
        .configure(State::A)
        .permit(Trigger::X, State::B)
        .unwrap();
    machine
        .configure(State::B)
        .initial_transition(State::C)
        .unwrap();
    machine
        .configure(State::C)
        .substate_of(State::B)
        .unwrap()
        .initial_transition(State::D)
        .unwrap();
    machine
        .configure(State::D)
        .substate_of(State::C)
        .unwrap();

    machine.fire(Trigger::X).unwrap();

    assert_eq!(*stored.lock(), State::D);
    assert_eq!(writes.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_or_ignored_fires_do_not_call_mutator() {
    let writes = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&writes);
    let machine = StateMachine::with_external_state(
        || State::A,
        move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        },
        FiringMode::Immediate,
    );
    machine.configure(State::A).ignore(Trigger::Y);

    machine.fire(Trigger::Y).unwrap();
    assert!(machine.fire(Trigger::X).is_err());

    assert_eq!(writes.load(Ordering::SeqCst), 0);
}

#[test]
fn state_is_visible_to_callbacks_during_fire() {
    let observed = Arc::new(Mutex::new(Vec::new()));
    let machine = StateMachine::new(State::A);
    let weak = machine.downgrade();
    let sink = Arc::clone(&observed);
    machine
        .configure(State::A)
        .permit(Trigger::X, State::B)
        .unwrap()
        .on_exit(move |_| {
            if let Some(machine) = weak.upgrade() {
                sink.lock().push(machine.state());
            }
        });
    let weak = machine.downgrade();
    let sink = Arc::clone(&observed);
    machine.configure(State::B).on_entry(move |_| {
        if let Some(machine) = weak.upgrade() {
            sink.lock().push(machine.state());
        }
    });

    machine.fire(Trigger::X).unwrap();

    assert_eq!(*observed.lock(), vec![State::A, State::B]);
}
