use state_machines::state_machine;

state_machine! {
    name: SimulationMachine,
    state: SimulationState,
    initial: Ready,
    states: [Ready, Parsed, Extracted, ClausesSelected, CasesRetrieved, CasesSelected, Simulated, Failed],
    events {
        parse { transition: { from: Ready, to: Parsed } }
        extract { transition: { from: Parsed, to: Extracted } }
        select_clauses { transition: { from: Extracted, to: ClausesSelected } }
        retrieve { transition: { from: ClausesSelected, to: CasesRetrieved } }
        select_cases { transition: { from: CasesRetrieved, to: CasesSelected } }
        simulate { transition: { from: CasesSelected, to: Simulated } }
        abort {
            transition: { from: Ready, to: Failed }
            transition: { from: Parsed, to: Failed }
            transition: { from: Extracted, to: Failed }
            transition: { from: ClausesSelected, to: Failed }
            transition: { from: CasesRetrieved, to: Failed }
            transition: { from: CasesSelected, to: Failed }
            transition: { from: Simulated, to: Failed }
        }
    }
}

pub fn ready() -> SimulationMachine<(), Ready> {
    SimulationMachine::new(())
}
