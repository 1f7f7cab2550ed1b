//! Asynchronous firing, activation and notification.

mod common;

use common::{Log, State, Trigger};
use futures::future::{BoxFuture, FutureExt};
use statehouse::{FiringMode, MachineError, StateMachine, Transition};

fn async_label(
    log: &Log,
    label: &str,
) -> impl Fn(Transition<State, Trigger>) -> BoxFuture<'static, ()> + Send + Sync + 'static {
    let log = log.clone();
    let label = label.to_string();
    move |_| {
        let log = log.clone();
        let label = label.clone();
        async move {
            tokio::task::yield_now().await;
            log.push(label);
        }
        .boxed()
    }
}

#[tokio::test]
async fn fire_async_runs_async_entry_in_order() {
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
        .on_entry_async(async_label(&log, "EnterB"));
    machine
        .configure(State::C)
        .substate_of(State::B)
        .unwrap()
        .on_entry(log.on("EnterC"));
    machine.on_transitioned(log.hops());

    machine.fire_async(Trigger::X).await.unwrap();

    assert_eq!(machine.state(), State::C);
    assert_eq!(
        log.entries(),
        vec!["ExitA", "A->B", "EnterB", "B->C", "EnterC"]
    );
}

#[tokio::test]
async fn sync_fire_rejects_async_entry_before_running_anything() {
    let log = Log::default();
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit(Trigger::X, State::B)
        .unwrap()
        .on_exit(log.on("ExitA"));
    machine
        .configure(State::B)
        .on_entry_async(async_label(&log, "EnterB"));

    let result = machine.fire(Trigger::X);

    assert_eq!(
        result,
        Err(MachineError::InvalidOperation(
            "Cannot execute asynchronous action specified in OnEntry event for 'B' state. \
             Use asynchronous version of Fire [fire_async]"
                .to_string()
        ))
    );
    assert_eq!(machine.state(), State::A);
    assert!(log.entries().is_empty());

    machine.fire_async(Trigger::X).await.unwrap();
    assert_eq!(machine.state(), State::B);
}

#[tokio::test]
async fn sync_fire_rejects_async_notification() {
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit(Trigger::X, State::B)
        .unwrap();
    machine.on_transition_completed_async(|_| async {});

    let message = machine.fire(Trigger::X).err().map(|e| e.to_string());

    assert_eq!(
        message.as_deref(),
        Some(
            "Cannot execute asynchronous action specified in OnTransitionCompleted event. \
             Use asynchronous version of Fire [fire_async]"
        )
    );
    assert_eq!(machine.state(), State::A);
}

#[tokio::test]
async fn async_notifications_run_in_order() {
    let log = Log::default();
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .permit(Trigger::X, State::B)
        .unwrap();
    let transitioned = log.clone();
    machine.on_transitioned_async(move |t: Transition<State, Trigger>| {
        let log = transitioned.clone();
        async move { log.push(format!("{:?}->{:?}", t.source(), t.destination())) }
    });
    machine.on_transition_completed_async(async_label(&log, "Completed"));

    machine.fire_async(Trigger::X).await.unwrap();

    assert_eq!(log.entries(), vec!["A->B", "Completed"]);
}

#[tokio::test]
async fn async_internal_transition() {
    let log = Log::default();
    let machine = StateMachine::new(State::A);
    machine
        .configure(State::A)
        .internal_transition_async(Trigger::X, async_label(&log, "Handled"))
        .on_exit(log.on("ExitA"));

    assert!(machine.fire(Trigger::X).is_err());
    machine.fire_async(Trigger::X).await.unwrap();

    assert_eq!(machine.state(), State::A);
    assert_eq!(log.entries(), vec!["Handled"]);
}

#[tokio::test]
async fn async_superstate_is_not_exited_between_substates() {
    let log = Log::default();
    let machine = StateMachine::new(State::B);
    machine
        .configure(State::A)
        .on_exit_async(async_label(&log, "ExitA"));
    machine
        .configure(State::B)
        .substate_of(State::A)
        .unwrap()
        .permit(Trigger::X, State::C)
        .unwrap()
        .on_exit_async(async_label(&log, "ExitB"));
    machine
        .configure(State::C)
        .substate_of(State::A)
        .unwrap()
        .on_entry_async(async_label(&log, "EnterC"));

    machine.fire_async(Trigger::X).await.unwrap();

    assert_eq!(log.entries(), vec!["ExitB", "EnterC"]);
}

#[tokio::test]
async fn async_activation_and_sync_rejection() {
    let log = Log::default();
    let machine = StateMachine::<State, Trigger>::new(State::B);
    let activated = log.clone();
    machine.configure(State::A).on_activate_async(move || {
        let log = activated.clone();
        async move { log.push("ActivateA") }
    });
    machine
        .configure(State::B)
        .substate_of(State::A)
        .unwrap()
        .on_activate(log.lifecycle("ActivateB"))
        .on_deactivate(log.lifecycle("DeactivateB"));

    assert_eq!(
        machine.activate().err().map(|e| e.to_string()).as_deref(),
        Some(
            "Cannot execute asynchronous action specified in OnActivate event for 'A' state. \
             Use asynchronous version of Activate [activate_async]"
        )
    );
    assert!(!machine.is_activated());
    assert!(log.entries().is_empty());

    machine.activate_async().await;
    machine.activate_async().await;
    assert!(machine.is_activated());

    machine.deactivate_async().await;
    assert!(!machine.is_activated());

    assert_eq!(log.entries(), vec!["ActivateA", "ActivateB", "DeactivateB"]);
}

#[tokio::test]
async fn async_unhandled_handler() {
    let log = Log::default();
    let machine = StateMachine::with_mode(State::A, FiringMode::Immediate);
    let handled = log.clone();
    machine.on_unhandled_trigger_async(move |state: State, trigger: Trigger, _: Vec<String>| {
        let log = handled.clone();
        async move { log.push(format!("unhandled {:?} in {:?}", trigger, state)) }
    });

    assert!(machine.fire(Trigger::Y).is_err());
    machine.fire_async(Trigger::Y).await.unwrap();

    assert_eq!(log.entries(), vec!["unhandled Y in A"]);
}

#[tokio::test]
async fn queued_async_fires_drain_in_order() {
    let log = Log::default();
    let machine = StateMachine::new(State::A);
    let weak = machine.downgrade();
    machine
        .configure(State::A)
        .permit(Trigger::X, State::B)
        .unwrap();
    machine
        .configure(State::B)
        .permit(Trigger::Y, State::C)
        .unwrap()
        .on_entry_async(move |_| {
            let weak = weak.clone();
            async move {
                if let Some(machine) = weak.upgrade() {
                    machine.fire_async(Trigger::Y).await.unwrap();
                }
            }
        });
    machine.on_transitioned(log.hops());

    machine.fire_async(Trigger::X).await.unwrap();

    assert_eq!(machine.state(), State::C);
    assert_eq!(log.entries(), vec!["A->B", "B->C"]);
}

#[tokio::test]
async fn fire_params_async_validates_arguments() {
    let machine = StateMachine::new(State::A);
    let select = machine
        .set_trigger_parameters::<(u8,)>(Trigger::X)
        .unwrap();
    machine.configure(State::A).permit_dynamic(Trigger::X, |args| {
        match args.get::<u8>(0) {
            Some(0) => State::B,
            _ => State::C,
        }
    });

    assert!(matches!(
        machine.fire_with_async(Trigger::X, ("zero",)).await,
        Err(MachineError::Parameters(_))
    ));
    machine.fire_params_async(&select, (0,)).await.unwrap();

    assert_eq!(machine.state(), State::B);
}
