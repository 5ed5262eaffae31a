use state_machines::state_machine;

state_machine! {
    name: IngestionMachine,
    state: IngestionState,
    initial: Ready,
    states: [Ready, Parsed, Summarized, Extracted, Failed],
    events {
        parse { transition: { from: Ready, to: Parsed } }
        summarize { transition: { from: Parsed, to: Summarized } }
        extract { transition: { from: Summarized, to: Extracted } }
        abort {
            transition: { from: Ready, to: Failed }
            transition: { from: Parsed, to: Failed }
            transition: { from: Summarized, to: Failed }
            transition: { from: Extracted, to: Failed }
        }
    }
}

pub fn ready() -> IngestionMachine<(), Ready> {
    IngestionMachine::new(())
}
