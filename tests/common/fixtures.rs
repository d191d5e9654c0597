//! Database and script fixtures in the reference solver's grammar
//!
//! The master-species list is pre-sorted with valence states contiguous
//! after their parent element, which is the ordering contract valence
//! expansion relies on.

/// Thermodynamic database shared by all scenarios.
pub const BASE_DATABASE: &str = "\
MASTER_SPECIES
    Ba
    C
    C(-4)
    C(4)
    Ca
    Cl
    Fe
    Fe(2)
    Fe(3)
    H
    H(0)
    H(1)
    Mg
    Na
    O
    O(-2)
    O(0)
    S
    S(-2)
    S(6)
    Sr
SPECIES
    X-
    CaX2
    NaX
    Hfo_wOH
END
";

/// One solution in equilibrium with Calcite and Dolomite, no kinetics.
pub const CALCITE_SCRIPT: &str = "\
SOLUTION_RAW 1
    -temp 25
    -pressure 1
    -ph 7.5
    -pe 4
    -cb 1e-9
    -total_h 110.0124
    -total_o 55.5062
    -volume 1
    -totals
        Ca 0.0012
        Cl 0.0024
        Mg 0.0006
        Na 0.001
EQUILIBRIUM_PHASES_RAW 1
    -component Calcite
        -moles 0.001
        -si 0
    -component Dolomite
        -moles 0.0005
        -si -0.3
END
";

/// Four cells with heterogeneous reactants: cell 1 equilibrates with
/// Celestite, cell 2 dissolves it kinetically, cell 3 carries Barite and
/// Celestite kinetics, cell 4 is a plain solution.
pub const BARITE_SCRIPT: &str = "\
SOLUTION_RAW 1
    -temp 25
    -pressure 1
    -ph 7
    -pe 4
    -cb 1e-9
    -total_h 110.0124
    -total_o 55.5062
    -volume 1
    -totals
        Ba 1e-5
        Cl 0.002
        S 0.0001
        Sr 0.001
EQUILIBRIUM_PHASES_RAW 1
    -component Celestite
        -moles 0.001
        -si 0
SOLUTION_RAW 2
    -temp 25
    -pressure 1
    -ph 7
    -pe 4
    -cb 1e-9
    -total_h 110.0124
    -total_o 55.5062
    -volume 1
    -totals
        Ba 1e-5
        Cl 0.002
        S 0.0001
        Sr 0.001
KINETICS_RAW 2
    -component Celestite
        -m 0.001
        -params 0.5 2
SOLUTION_RAW 3
    -temp 25
    -pressure 1
    -ph 7
    -pe 4
    -cb 1e-9
    -total_h 110.0124
    -total_o 55.5062
    -volume 1
    -totals
        Ba 1e-5
        Cl 0.002
        S 0.0001
        Sr 0.001
KINETICS_RAW 3
    -component Barite
        -m 0.0002
        -params 0.1
    -component Celestite
        -m 0.001
        -params 0.5 2
SOLUTION_RAW 4
    -temp 25
    -pressure 1
    -ph 7
    -pe 4
    -cb 1e-9
    -total_h 110.0124
    -total_o 55.5062
    -volume 1
    -totals
        Ba 1e-5
        Cl 0.002
        S 0.0001
        Sr 0.001
END
";

/// One solution with iron in two valence states.
pub const REDOX_SCRIPT: &str = "\
SOLUTION_RAW 1
    -temp 25
    -pressure 1
    -ph 6.8
    -pe 4
    -cb 1e-9
    -total_h 110.0124
    -total_o 55.5062
    -volume 1
    -totals
        Ca 0.001
        Fe(2) 0.0002
        Fe(3) 0.0004
END
";

/// One solution with an exchanger assemblage.
pub const EXCHANGE_SCRIPT: &str = "\
SOLUTION_RAW 1
    -temp 25
    -pressure 1
    -ph 7
    -pe 4
    -cb 1e-9
    -total_h 110.0124
    -total_o 55.5062
    -volume 1
    -totals
        Ca 0.0012
        Na 0.001
EXCHANGE_RAW 1
    -component X
        -cb 0
        -la -2
        -phase_proportion 0
        -formula_z -1
        -totals
            Ca 0.0004
            Na 0.0002
            X 0.0015
END
";

/// One solution with a surface-complexation assemblage.
pub const SURFACE_SCRIPT: &str = "\
SOLUTION_RAW 1
    -temp 25
    -pressure 1
    -ph 7
    -pe 4
    -cb 1e-9
    -total_h 110.0124
    -total_o 55.5062
    -volume 1
    -totals
        Ca 0.0012
        Cl 0.0024
SURFACE_RAW 1
    -component Hfo_wOH
        -moles 0.0002
        -la -3.5
        -cb 0
        -totals
            Hfo_wOH 0.0002
    -charge Hfo_w
        -area 600
        -grams 1
        -cb 0
        -mass_water 1
        -la_psi 0
END
";

/// Calcite scenario extended with a selected-output request.
pub const SELECTED_OUTPUT_SCRIPT: &str = "\
SOLUTION_RAW 1
    -temp 25
    -pressure 1
    -ph 7.5
    -pe 4
    -cb 1e-9
    -total_h 110.0124
    -total_o 55.5062
    -volume 1
    -totals
        Ca 0.0012
        Cl 0.0024
SELECTED_OUTPUT
    -headings pH Ca
USER_PUNCH
    -headings days
END
";

/// Calcite scenario with explicit solver knobs.
pub const KNOBS_SCRIPT: &str = "\
KNOBS
    -iterations 250
    -convergence_tolerance 1e-9
    -tolerance 1e-14
    -step_size 50
    -pe_step_size 5
    -diagonal_scale true
SOLUTION_RAW 1
    -temp 25
    -pressure 1
    -ph 7.5
    -pe 4
    -cb 1e-9
    -total_h 110.0124
    -total_o 55.5062
    -volume 1
    -totals
        Ca 0.0012
END
";
