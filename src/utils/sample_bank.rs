// src/utils/sample_bank.rs

use crate::{
    error::ExamError,
    models::question::{Difficulty, Question, QuestionBank, QuestionType, Section},
};

use Difficulty::{Easy, Hard, Medium};

const MCQ_MARKS: u32 = 1;
const SHORT_MARKS: u32 = 4;
const LONG_MARKS: u32 = 10;

const SECTION_A: [(&str, [&str; 4], Difficulty); 20] = [
    (
        "What is the SI unit of force?",
        ["Joule", "Newton", "Watt", "Pascal"],
        Easy,
    ),
    (
        "Which gas is most abundant in Earth's atmosphere?",
        ["Oxygen", "Carbon dioxide", "Nitrogen", "Argon"],
        Easy,
    ),
    (
        "What is the derivative of sin(x)?",
        ["cos(x)", "-cos(x)", "-sin(x)", "tan(x)"],
        Easy,
    ),
    (
        "Which organelle is known as the powerhouse of the cell?",
        ["Nucleus", "Ribosome", "Golgi body", "Mitochondrion"],
        Easy,
    ),
    (
        "What is the pH of a neutral solution at 25°C?",
        ["0", "7", "10", "14"],
        Easy,
    ),
    (
        "Which of these is a prime number?",
        ["21", "27", "29", "33"],
        Easy,
    ),
    (
        "The speed of light in vacuum is approximately:",
        ["3 × 10^8 m/s", "3 × 10^6 m/s", "1.5 × 10^8 m/s", "3 × 10^5 m/s"],
        Medium,
    ),
    (
        "Which element has the atomic number 6?",
        ["Oxygen", "Carbon", "Nitrogen", "Boron"],
        Easy,
    ),
    (
        "What is the value of log10(1000)?",
        ["2", "3", "10", "100"],
        Easy,
    ),
    (
        "Which law states that pressure and volume are inversely proportional at constant temperature?",
        ["Charles's law", "Boyle's law", "Avogadro's law", "Gay-Lussac's law"],
        Medium,
    ),
    (
        "DNA replication is described as:",
        ["Conservative", "Dispersive", "Semi-conservative", "Random"],
        Medium,
    ),
    (
        "What is the integral of 1/x dx?",
        ["x^2/2 + C", "ln|x| + C", "e^x + C", "1/x^2 + C"],
        Medium,
    ),
    (
        "Which type of bond holds the two strands of DNA together?",
        ["Ionic", "Covalent", "Hydrogen", "Metallic"],
        Medium,
    ),
    (
        "The resistance of a wire is directly proportional to its:",
        ["Cross-sectional area", "Length", "Temperature only", "Mass"],
        Medium,
    ),
    (
        "Which quantum number describes the shape of an orbital?",
        ["Principal", "Azimuthal", "Magnetic", "Spin"],
        Hard,
    ),
    (
        "What is the determinant of the 2x2 matrix [[2, 3], [1, 4]]?",
        ["5", "8", "11", "-5"],
        Medium,
    ),
    (
        "In an ideal transformer, if the turns ratio is 1:10, the output voltage is:",
        [
            "One tenth of the input",
            "Equal to the input",
            "Ten times the input",
            "A hundred times the input",
        ],
        Hard,
    ),
    (
        "Which enzyme unwinds the DNA double helix during replication?",
        ["Ligase", "Primase", "Helicase", "Polymerase I"],
        Hard,
    ),
    (
        "What is the hybridization of carbon in ethyne (C2H2)?",
        ["sp", "sp2", "sp3", "sp3d"],
        Hard,
    ),
    (
        "The sum of the interior angles of a hexagon is:",
        ["540°", "720°", "900°", "1080°"],
        Medium,
    ),
];

const SECTION_B: [(&str, Difficulty); 10] = [
    ("State Newton's second law of motion and give its mathematical form.", Easy),
    ("Explain the difference between mitosis and meiosis.", Medium),
    ("Define molarity and write its unit.", Easy),
    ("Differentiate f(x) = x^3 · e^x and simplify.", Medium),
    ("What is the photoelectric effect? Name one of its applications.", Medium),
    ("Describe the role of chlorophyll in photosynthesis.", Easy),
    ("Explain why the boiling point of water decreases at high altitude.", Medium),
    ("State Ohm's law and mention one of its limitations.", Easy),
    ("What is Le Chatelier's principle? Give an example.", Hard),
    ("Find the roots of x^2 - 5x + 6 = 0 and verify them.", Easy),
];

const SECTION_C: [(&str, Difficulty); 5] = [
    (
        "Derive the equations of motion for a body under uniform acceleration using graphical methods.",
        Hard,
    ),
    (
        "Describe the process of protein synthesis, covering transcription and translation in detail.",
        Hard,
    ),
    (
        "Explain the periodic trends of atomic radius, ionization energy and electronegativity with reasons.",
        Medium,
    ),
    (
        "Prove that the derivative of a^x is a^x · ln(a) from first principles, then apply it to 2^x.",
        Hard,
    ),
    (
        "Discuss the causes and consequences of the greenhouse effect and propose mitigation strategies.",
        Medium,
    ),
];

/// The built-in sample paper: 20 MCQs, 10 short answers, 5 long answers.
pub fn sample_questions() -> Vec<Question> {
    let mcqs = SECTION_A.iter().map(|(text, options, difficulty)| {
        (
            Section::A,
            *text,
            MCQ_MARKS,
            *difficulty,
            QuestionType::Mcq,
            options.iter().map(|o| o.to_string()).collect::<Vec<_>>(),
        )
    });
    let shorts = SECTION_B.iter().map(|(text, difficulty)| {
        (
            Section::B,
            *text,
            SHORT_MARKS,
            *difficulty,
            QuestionType::Short,
            Vec::new(),
        )
    });
    let longs = SECTION_C.iter().map(|(text, difficulty)| {
        (
            Section::C,
            *text,
            LONG_MARKS,
            *difficulty,
            QuestionType::Long,
            Vec::new(),
        )
    });

    mcqs.chain(shorts)
        .chain(longs)
        .zip(1u32..)
        .map(|((section, text, marks, difficulty, question_type, options), id)| {
            Question::new(id, section, text, marks, difficulty, question_type, options)
        })
        .collect()
}

pub fn sample_bank() -> Result<QuestionBank, ExamError> {
    QuestionBank::new(sample_questions())
}
